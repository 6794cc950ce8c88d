//! Services exposed to the HTTP handlers.
//!
//! Each service wraps the commands and queries of one area. They are built once
//! in [`Services::new`] from explicit dependencies and cloned into handlers.

use std::sync::Arc;

use crate::{
    cache::CacheBackend,
    commands::CommandContext,
    events::EventSender,
    queries::QueryContext,
    repositories::Repositories,
    validation::InventoryPolicy,
};

pub mod aisles;
pub mod dashboard;
pub mod functions;
pub mod history;
pub mod medicines;
pub mod users;

pub use aisles::AisleService;
pub use dashboard::DashboardService;
pub use functions::ValidationFunctions;
pub use history::HistoryService;
pub use medicines::MedicineService;
pub use users::UserService;

#[derive(Clone)]
pub struct Services {
    pub medicines: Arc<MedicineService>,
    pub aisles: Arc<AisleService>,
    pub history: Arc<HistoryService>,
    pub dashboard: Arc<DashboardService>,
    pub users: Arc<UserService>,
    pub functions: Arc<ValidationFunctions>,
}

impl Services {
    pub fn new(
        repos: Repositories,
        events: EventSender,
        policy: InventoryPolicy,
        cache: Option<Arc<dyn CacheBackend>>,
    ) -> Self {
        let queries = QueryContext::new(repos.clone(), policy.expiring_soon_days);
        let commands = CommandContext::new(repos.clone(), events, policy);

        Self {
            medicines: Arc::new(MedicineService::new(
                commands.clone(),
                queries.clone(),
                cache,
            )),
            aisles: Arc::new(AisleService::new(commands, queries.clone())),
            history: Arc::new(HistoryService::new(queries.clone())),
            dashboard: Arc::new(DashboardService::new(queries)),
            users: Arc::new(UserService::new(repos.clone())),
            functions: Arc::new(ValidationFunctions::new(repos)),
        }
    }
}
