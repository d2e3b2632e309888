//! API server entry point.

use std::sync::Arc;

use api::config::{Config, LogFormat};
use api::state::{AppState, DynInvoiceStore, DynPrintService};
use api::{HttpIdentityService, IdentityService};
use invoice_store::{InMemoryInvoiceStore, PostgresInvoiceStore};
use saga::{HttpInventoryService, HttpPrintService, InventoryClientConfig, OrchestratorConfig};
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = Config::from_env();

    // 1. Initialize tracing
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    // 3. Open the invoice store
    let (store, postgres): (DynInvoiceStore, Option<PostgresInvoiceStore>) =
        match &config.database_url {
            Some(url) => {
                let pool = PgPoolOptions::new()
                    .min_connections(1)
                    .max_connections(config.db_max_connections)
                    .connect(url)
                    .await?;
                let store = PostgresInvoiceStore::new(pool);
                store.run_migrations().await?;
                tracing::info!(max_connections = config.db_max_connections, "connected to postgres");
                (Arc::new(store.clone()) as DynInvoiceStore, Some(store))
            }
            None => {
                tracing::warn!("DATABASE_URL not set, invoices are kept in memory");
                (Arc::new(InMemoryInvoiceStore::new()) as DynInvoiceStore, None)
            }
        };

    // 4. Collaborator clients
    let mut inventory_config = InventoryClientConfig::new(config.inventory_base_url.as_str())
        .with_timeout(config.inventory_timeout);
    if let Some(token) = &config.inventory_token {
        inventory_config = inventory_config.with_token(token.as_str());
    }
    let inventory = Arc::new(HttpInventoryService::new(inventory_config)?);

    let printer = match &config.print_base_url {
        Some(url) => {
            Some(Arc::new(HttpPrintService::new(url.as_str(), config.print_timeout)?) as DynPrintService)
        }
        None => {
            tracing::info!("PRINT_BASE_URL not set, invoice printing disabled");
            None
        }
    };

    let identity = match &config.identity_base_url {
        Some(url) => Some(Arc::new(HttpIdentityService::new(
            url.as_str(),
            config.identity_timeout,
        )?) as Arc<dyn IdentityService>),
        None => {
            tracing::warn!("IDENTITY_BASE_URL not set, billing routes are open");
            None
        }
    };

    // 5. Build the application
    let state = Arc::new(AppState::new(
        store,
        inventory,
        printer,
        OrchestratorConfig {
            auto_commit: config.commit_after_create,
        },
        config.report_currency.as_str(),
    ));
    let app = api::create_app(state, metrics_handle, identity);

    // 6. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting billing API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(store) = postgres {
        store.close().await;
    }
    tracing::info!("server shut down gracefully");
    Ok(())
}
