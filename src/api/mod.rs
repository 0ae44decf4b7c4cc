// ============================================================================
// HTTP API - actix-web routes over the domain handlers
// ============================================================================
//
// Routes:
// - POST   /corporate/employees/upload   roster upload (corporate)
// - POST   /corporate/orders/bulk        bulk placement (corporate)
// - GET    /cart, DELETE /cart, PUT /cart/items
// - GET    /products/{id}/price?quantity=N
// - GET    /orders, GET /orders/track?token=&email= (public)
//
// ============================================================================

use std::sync::Arc;

use actix::Addr;
use actix_web::web;

use crate::domain::employee::RosterCommandHandler;
use crate::domain::order::{BulkOrderCommandHandler, BulkOrderSettings};
use crate::metrics::Metrics;
use crate::notifications::NotificationActor;
use crate::store::CommerceStore;
use crate::utils::PayloadCipher;

mod auth;
mod bulk_orders;
mod cart;
mod employees;
mod orders;
mod products;
mod sealed;

/// Shared by every worker
pub struct AppState {
    pub store: Arc<dyn CommerceStore>,
    pub rosters: RosterCommandHandler,
    pub bulk_orders: BulkOrderCommandHandler,
    pub cipher: Option<PayloadCipher>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        store: Arc<dyn CommerceStore>,
        notifier: Addr<NotificationActor>,
        metrics: Arc<Metrics>,
        settings: BulkOrderSettings,
        cipher: Option<PayloadCipher>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            rosters: RosterCommandHandler::new(store.clone(), metrics.clone()),
            bulk_orders: BulkOrderCommandHandler::new(store.clone(), notifier, metrics, settings),
            store,
            cipher,
            max_upload_bytes,
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/corporate")
            .route("/employees/upload", web::post().to(employees::upload))
            .route("/orders/bulk", web::post().to(bulk_orders::place)),
    )
    .service(
        web::resource("/cart")
            .route(web::get().to(cart::show))
            .route(web::delete().to(cart::clear)),
    )
    .service(web::resource("/cart/items").route(web::put().to(cart::set_item)))
    .service(web::resource("/products/{id}/price").route(web::get().to(products::price)))
    .service(web::resource("/orders").route(web::get().to(orders::list)))
    .service(web::resource("/orders/track").route(web::get().to(orders::track)));
}

// ============================================================================
// HTTP Tests
// ============================================================================
