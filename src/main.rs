use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use groupsync::{
    AppState, build_app,
    config::AppConfig,
    db::DbPool,
    jobs, observability, secrets,
    services::Services,
};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(version, about = "Identity group membership sync", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config file
    #[arg(short, long, global = true, default_value = "groupsync.toml")]
    config: PathBuf,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Start the HTTP server and scheduled sync (default)
    Serve,
    /// Run database migrations and exit
    Migrate,
    /// Reconcile every mapping of one organization and exit
    Sync {
        /// Organization ID
        #[arg(long)]
        org: Uuid,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match AppConfig::from_file(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!(
                "Failed to load config from {}: {}",
                args.config.display(),
                e
            );
            std::process::exit(1);
        }
    };

    if let Err(e) = observability::init_tracing(&config.observability) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    match args.command {
        Some(Command::Migrate) => run_migrate(&config).await,
        Some(Command::Sync { org }) => run_sync(config, org).await,
        Some(Command::Serve) | None => run_server(config).await,
    }
}

async fn open_database(config: &AppConfig, migrate: bool) -> Arc<DbPool> {
    let db = match DbPool::from_config(&config.database).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(error = %e, "Failed to open database");
            std::process::exit(1);
        }
    };
    if migrate && let Err(e) = db.run_migrations().await {
        tracing::error!(error = %e, "Failed to run database migrations");
        std::process::exit(1);
    }
    Arc::new(db)
}

fn build_services(config: &AppConfig, db: Arc<DbPool>) -> Services {
    let http = match reqwest::Client::builder()
        .timeout(config.identity_sync.request_timeout())
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build HTTP client");
            std::process::exit(1);
        }
    };
    let secrets = secrets::from_config(&config.secrets);
    Services::new(db, secrets, http, &config.identity_sync)
}

async fn run_migrate(config: &AppConfig) {
    open_database(config, true).await;
    tracing::info!("Migrations complete");
}

async fn run_sync(config: AppConfig, org_id: Uuid) {
    let db = open_database(&config, config.database.run_migrations()).await;
    let services = build_services(&config, db);

    match services.identity_sync.sync_all(org_id).await {
        Ok(report) => {
            tracing::info!(
                %org_id,
                total_added = report.total_added,
                total_removed = report.total_removed,
                errors = report.errors.len(),
                "Sync complete"
            );
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => tracing::error!(error = %e, "Failed to serialize sync report"),
            }
            if !report.errors.is_empty() {
                std::process::exit(2);
            }
        }
        Err(e) => {
            tracing::error!(%org_id, error = %e, "Sync failed");
            std::process::exit(1);
        }
    }
}

async fn run_server(config: AppConfig) {
    let db = open_database(&config, config.database.run_migrations()).await;
    let services = build_services(&config, db.clone());

    if config.server.admin_token.is_none() {
        tracing::warn!(
            "No admin token configured: admin routes are unauthenticated. \
             Set server.admin_token for anything beyond local use."
        );
    }
    if config.identity_sync.webhook.secret.is_none() {
        tracing::warn!("No webhook secret configured: identity events are accepted unsigned");
    }

    let worker = tokio::spawn(jobs::start_identity_sync_worker(
        db.clone(),
        services.identity_sync.clone(),
        config.identity_sync.schedule.clone(),
    ));

    let addr = std::net::SocketAddr::new(config.server.host, config.server.port);
    let state = AppState {
        config: Arc::new(config),
        db,
        services,
    };
    let app = build_app(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, "Listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
    }

    worker.abort();
    tracing::info!("Shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
