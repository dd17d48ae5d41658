pub mod dao;
pub mod lifecycle;
pub mod notify;
pub mod presence;

pub use lifecycle::LifecycleService;
pub use notify::{NotifyService, NotifyTarget};
pub use presence::{Presence, PresenceRegistry};
