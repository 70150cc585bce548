use std::env;
use std::sync::Arc;

use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::{Context, anyhow};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use smartleave::config::{Config, StoreBackend};
use smartleave::db::{ensure_schema, init_db};
use smartleave::docs::ApiDoc;
use smartleave::notify::{ApprovalLinks, LogNotifier, Notifier, SmtpNotifier};
use smartleave::routes;
use smartleave::service::LeaveService;
use smartleave::store::{
    BalanceStore, InMemoryBalanceStore, InMemoryLeaveStore, LeaveStore, MySqlBalanceStore,
    MySqlLeaveStore,
};

type Stores = (Arc<dyn LeaveStore>, Arc<dyn BalanceStore>);

async fn build_stores(config: &Config) -> anyhow::Result<Stores> {
    match config.store_backend {
        StoreBackend::Memory => {
            info!("Using in-memory stores, data is lost on restart");
            let leaves: Arc<dyn LeaveStore> = Arc::new(InMemoryLeaveStore::new());
            let balances: Arc<dyn BalanceStore> = Arc::new(InMemoryBalanceStore::new());
            Ok((leaves, balances))
        }
        StoreBackend::Mysql => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow!("DATABASE_URL must be set when STORE_BACKEND=mysql"))?;
            let pool = init_db(database_url).context("invalid DATABASE_URL")?;

            // The pool is lazy; an unreachable database only fails requests.
            if let Err(e) = ensure_schema(&pool, &config.leave_table, &config.balance_table).await {
                error!(error = %e, "Failed to ensure leave tables");
            }

            let leaves: Arc<dyn LeaveStore> =
                Arc::new(MySqlLeaveStore::new(pool.clone(), &config.leave_table)?);
            let balances: Arc<dyn BalanceStore> =
                Arc::new(MySqlBalanceStore::new(pool, &config.balance_table)?);
            Ok((leaves, balances))
        }
    }
}

fn build_notifier(config: &Config) -> anyhow::Result<Arc<dyn Notifier>> {
    if config.smtp.skip_send {
        return Ok(Arc::new(LogNotifier));
    }
    let notifier = SmtpNotifier::new(&config.smtp, &config.sender_email)?;
    Ok(Arc::new(notifier))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Rolling daily log
    let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());
    let level = env::var("LOG_LEVEL")
        .ok()
        .and_then(|l| l.parse::<tracing::Level>().ok())
        .unwrap_or(tracing::Level::INFO);
    let file_appender = rolling::daily(log_dir, "smartleave.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let config = Config::from_env();
    let (leaves, balances) = build_stores(&config).await?;
    let notifier = build_notifier(&config)?;
    let links = ApprovalLinks::new(&config.approval_link_url)
        .with_context(|| format!("invalid APPROVAL_LINK_URL `{}`", config.approval_link_url))?;

    let service = Data::new(LeaveService::new(leaves, balances, notifier, links));
    let server_addr = config.server_addr.clone();

    info!(%server_addr, backend = %config.store_backend, "Listening");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(service.clone())
            .configure(|cfg| routes::configure(cfg, &config))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
