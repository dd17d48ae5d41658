pub mod contract;
pub mod invoice;
pub mod notification;
pub mod project;
pub mod user;

pub use contract::{Contract, ContractStatus};
pub use invoice::{Invoice, InvoiceStatus};
pub use notification::{AlertMeta, Notification, NotificationKind};
pub use project::{Project, ProjectStatus};
pub use user::User;
