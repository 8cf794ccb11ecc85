use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use conference_registration::{
    auth::TokenService,
    config::Config,
    create_router, db,
    error::StartupError,
    payments::{HttpPaymentGateway, PaymentGateway, PaymentService, SandboxPaymentGateway},
    pricing::{Clock, PgPricingStore, PhaseCalendar, PhaseResolver},
    registrations::{AuditLogger, PgRegistrationStore, RegistrationService},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Conference Registration API - Starting...");

    let config = Config::from_env().map_err(|e| {
        tracing::error!("{}", e);
        e
    })?;

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&db_pool).await?;

    let pricing_store = Arc::new(PgPricingStore::new(db_pool.clone()));
    pricing_store.open_course(config.course_capacity).await?;

    let phases = PhaseResolver::new(PhaseCalendar::new(config.conference_year), Clock::System);
    tracing::info!(
        "Conference year {}, current booking phase: {}",
        config.conference_year,
        phases.current_phase()
    );

    let registrations = RegistrationService::new(
        Arc::new(PgRegistrationStore::new(db_pool.clone())),
        pricing_store.clone(),
        phases,
        AuditLogger::new(db_pool.clone()),
    );

    let gateway: Arc<dyn PaymentGateway> = match &config.payment_gateway {
        Some(gateway) => Arc::new(HttpPaymentGateway::new(
            gateway.base_url.clone(),
            gateway.api_key.clone(),
            config.payment_timeout,
        )?),
        None => {
            tracing::warn!("PAYMENT_GATEWAY_URL is not set, using the sandbox payment gateway");
            Arc::new(SandboxPaymentGateway::new())
        }
    };

    let state = AppState {
        pricing: pricing_store,
        phases,
        payments: PaymentService::new(registrations.clone(), gateway),
        registrations,
        tokens: TokenService::new(config.jwt_secret.clone()),
    };

    let app = create_router(state);

    let addr = config.bind_address();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Conference Registration API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
