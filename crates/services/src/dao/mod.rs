pub mod base;
pub mod contract;
pub mod invoice;
pub mod notification;
pub mod project;
pub mod user;

pub use contract::ContractDao;
pub use invoice::InvoiceDao;
pub use notification::NotificationDao;
pub use project::ProjectDao;
pub use user::UserDao;
