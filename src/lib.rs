pub mod config;
pub mod domain {
    pub mod notification;
    pub mod order;
}
pub mod error;
pub mod http {
    pub mod handlers {
        pub mod ops;
        pub mod orders;
        pub mod webhook;
    }
    pub mod middleware {
        pub mod admin_auth;
    }
    pub mod router;
}
pub mod notify;
pub mod repo {
    pub mod order_store;
    pub mod orders_repo;
}
pub mod sanitize;
pub mod service {
    pub mod reconciler;
    pub mod retry;
}
pub mod signature;
pub mod validation;

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub reconciler: service::reconciler::WebhookReconciler,
    pub store: Arc<dyn repo::order_store::OrderStore>,
}
