use choptym_payments::config::AppConfig;
use choptym_payments::notify::disabled::DisabledNotifier;
use choptym_payments::notify::http_email::HttpEmailNotifier;
use choptym_payments::notify::Notifier;
use choptym_payments::repo::order_store::OrderStore;
use choptym_payments::repo::orders_repo::PgOrderStore;
use choptym_payments::service::reconciler::{ReconcilerConfig, WebhookReconciler};
use choptym_payments::AppState;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    if cfg.webhook_secret.is_empty() {
        tracing::warn!("WEBHOOK_SECRET is empty, every signed webhook will be rejected");
    }
    if cfg.dev_bypass && !cfg!(feature = "dev-bypass") {
        tracing::warn!("WEBHOOK_DEV_BYPASS is set but this build has no dev-bypass support, ignoring");
    }

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&cfg.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let store: Arc<dyn OrderStore> = Arc::new(PgOrderStore { pool });
    let notifier: Arc<dyn Notifier> = if cfg.email_disabled {
        Arc::new(DisabledNotifier)
    } else {
        Arc::new(HttpEmailNotifier {
            api_url: cfg.email_api_url.clone(),
            api_key: cfg.email_api_key.clone(),
            from: cfg.email_from.clone(),
            timeout_ms: cfg.email_timeout_ms,
            client: reqwest::Client::new(),
        })
    };

    let reconciler = WebhookReconciler::new(store.clone(), notifier, ReconcilerConfig::from(&cfg));
    let state = AppState { reconciler, store };
    let app = choptym_payments::http::router::build(state, cfg.internal_api_key.clone());

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!(
        "listening on {} (signature headers: {})",
        cfg.bind_addr,
        cfg.signature_headers.join(", ")
    );
    axum::serve(listener, app).await?;
    Ok(())
}
