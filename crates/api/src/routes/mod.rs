pub mod lifecycle;
pub mod notification;
