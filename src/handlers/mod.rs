// HTTP surface, one module per resource family
pub mod access;
pub mod categories;
pub mod common;
pub mod documents;
pub mod gold_rates;
pub mod products;
pub mod users;
pub mod wholesalers;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub categories: Arc<crate::services::categories::CategoryService>,
    pub products: Arc<crate::services::products::ProductService>,
    pub wholesalers: Arc<crate::services::wholesalers::WholesalerService>,
    pub gold_rates: Arc<crate::services::gold_rates::GoldRateService>,
    pub documents: Arc<crate::services::documents::DocumentService>,
    pub users: Arc<crate::services::users::UserService>,
    pub access: Arc<crate::services::access::AccessService>,
}

impl AppServices {
    /// Build the service container shared by every handler.
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            categories: Arc::new(crate::services::categories::CategoryService::new(
                db_pool.clone(),
                Some(event_sender.clone()),
            )),
            products: Arc::new(crate::services::products::ProductService::new(
                db_pool.clone(),
                Some(event_sender.clone()),
            )),
            wholesalers: Arc::new(crate::services::wholesalers::WholesalerService::new(
                db_pool.clone(),
                Some(event_sender.clone()),
            )),
            gold_rates: Arc::new(crate::services::gold_rates::GoldRateService::new(
                db_pool.clone(),
                Some(event_sender.clone()),
            )),
            documents: Arc::new(crate::services::documents::DocumentService::new(
                db_pool.clone(),
                Some(event_sender.clone()),
            )),
            users: Arc::new(crate::services::users::UserService::new(
                db_pool.clone(),
                Some(event_sender.clone()),
            )),
            access: Arc::new(crate::services::access::AccessService::new(
                db_pool,
                Some(event_sender),
            )),
        }
    }
}
