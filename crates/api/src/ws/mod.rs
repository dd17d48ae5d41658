pub mod handler;
pub mod presence;
