use std::sync::Arc;

use crewhub_config::Settings;
use crewhub_services::{
    LifecycleService, NotifyService, Presence, PresenceRegistry,
    dao::{ContractDao, InvoiceDao, NotificationDao, ProjectDao, UserDao},
};
use mongodb::Database;

use crate::ws::presence::{WsPresence, WsSender};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub users: Arc<UserDao>,
    pub projects: Arc<ProjectDao>,
    pub contracts: Arc<ContractDao>,
    pub invoices: Arc<InvoiceDao>,
    pub notifications: Arc<NotificationDao>,
    pub notify: Arc<NotifyService>,
    pub lifecycle: Arc<LifecycleService>,
    pub presence: Arc<PresenceRegistry<WsSender>>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let users = Arc::new(UserDao::new(&db));
        let projects = Arc::new(ProjectDao::new(&db));
        let contracts = Arc::new(ContractDao::new(&db));
        let invoices = Arc::new(InvoiceDao::new(&db));
        let notifications = Arc::new(NotificationDao::new(&db));

        let presence = Arc::new(PresenceRegistry::new());
        let push: Arc<dyn Presence> = Arc::new(WsPresence::new(Arc::clone(&presence)));

        let notify = Arc::new(NotifyService::new(
            Arc::clone(&users),
            Arc::clone(&projects),
            Arc::clone(&notifications),
            push,
        ));

        let lifecycle = Arc::new(LifecycleService::new(
            Arc::clone(&projects),
            Arc::clone(&contracts),
            Arc::clone(&invoices),
            Arc::clone(&notifications),
            Arc::clone(&notify),
            settings.scheduler.invoice_grace_days,
        ));

        Self {
            db,
            settings,
            users,
            projects,
            contracts,
            invoices,
            notifications,
            notify,
            lifecycle,
            presence,
        }
    }
}
