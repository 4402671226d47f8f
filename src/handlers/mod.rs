pub mod assignments;
pub mod common;
pub mod dashboard;
pub mod directory;
pub mod products;
pub mod users;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    AssignmentService, DashboardService, DirectoryService, ProductService, UserService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub assignments: AssignmentService,
    pub products: ProductService,
    pub directory: DirectoryService,
    pub users: UserService,
    pub dashboard: DashboardService,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        let assignments = AssignmentService::new(db.clone(), event_sender.clone());
        let products = ProductService::new(
            db.clone(),
            event_sender.clone(),
            assignments.clone(),
            config.public_base_url.clone(),
        );
        let directory = DirectoryService::new(db.clone(), event_sender.clone());
        let users = UserService::new(db.clone(), event_sender);
        let dashboard = DashboardService::new(db);

        Self {
            assignments,
            products,
            directory,
            users,
            dashboard,
        }
    }
}
