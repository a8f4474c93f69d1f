use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use opsflow_api::state::AppState;
use opsflow_auth::JwtService;
use opsflow_core::services::{AuthService, NotificationService, TenantRequestWorkflow, WorkflowSettings};
use opsflow_infrastructure::database::connection;
use opsflow_infrastructure::{
    PgNotificationRepository, PgProfileRepository, PgTenantRequestRepository, PgUserRepository,
};
use opsflow_shared::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Initialize telemetry
    opsflow_shared::telemetry::init_telemetry();

    info!("Opsflow server starting...");

    // Load configuration
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Connect to Database
    info!("Connecting to database...");
    let pool = connection::create_pool(&config.database.url, config.database.max_connections).await?;
    info!("Database connection established.");

    // Apply schema migrations
    connection::MIGRATOR.run(&pool).await?;
    info!("Database migrations applied.");

    // Repositories
    let users = Arc::new(PgUserRepository::new(pool.clone()));
    let profiles = Arc::new(PgProfileRepository::new(pool.clone()));
    let requests = Arc::new(PgTenantRequestRepository::new(pool.clone()));
    let notification_repo = Arc::new(PgNotificationRepository::new(pool));

    // Services
    let jwt = Arc::new(JwtService::new(
        config.jwt.secret.clone(),
        config.jwt.access_token_expiry,
        config.jwt.refresh_token_expiry,
    ));
    let auth = Arc::new(AuthService::new(
        Arc::clone(&users),
        Arc::clone(&profiles),
        Arc::clone(&jwt),
    ));
    let notifications = Arc::new(NotificationService::new(notification_repo));
    let workflow = Arc::new(TenantRequestWorkflow::new(
        requests,
        Arc::clone(&profiles),
        Arc::clone(&notifications),
        WorkflowSettings::from_config(&config.workflow),
    ));

    let state = AppState {
        config: config.clone(),
        jwt,
        auth,
        profiles,
        workflow,
        notifications,
    };

    // Build router
    let app = opsflow_api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin("http://localhost:5173".parse::<axum::http::HeaderValue>()?)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PATCH,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::AUTHORIZATION,
                ]),
        );

    // Bind address
    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));
    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
