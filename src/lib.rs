// Conference registration service
//
// Pricing and eligibility rules, registration submission and payment
// checkout hand-off, served over a JSON HTTP API.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod payments;
pub mod pricing;
pub mod registrations;
pub mod validation;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use auth::TokenService;
use payments::PaymentService;
use pricing::{PhaseResolver, PricingSource};
use registrations::RegistrationService;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        pricing::handlers::fee_schedule_handler,
        pricing::handlers::packages_handler,
        pricing::handlers::quote_handler,
        registrations::handlers::submit_registration_handler,
        registrations::handlers::my_registration_handler,
        registrations::handlers::list_registrations_handler,
        registrations::handlers::update_payment_status_handler,
        payments::handlers::checkout_handler,
    ),
    components(
        schemas(
            HealthResponse,
            pricing::BookingPhase,
            pricing::PackageType,
            pricing::UserCategory,
            pricing::UnavailableReason,
            pricing::FeeTableEntry,
            pricing::PriceBreakdown,
            pricing::PackageAvailability,
            pricing::Workshop,
            pricing::handlers::FeeScheduleResponse,
            pricing::handlers::PackagesResponse,
            pricing::handlers::QuoteRequest,
            registrations::PaymentStatus,
            registrations::SupportingDocument,
            registrations::SubmitRegistrationRequest,
            registrations::Registration,
            registrations::UpdatePaymentRequest,
            payments::CheckoutResponse,
            payments::CheckoutSession,
        )
    ),
    tags(
        (name = "pricing", description = "Fee schedule, package availability and quotes"),
        (name = "registrations", description = "Attendee registration endpoints"),
        (name = "payments", description = "Payment checkout hand-off"),
        (name = "admin", description = "Registration console for administrators")
    ),
    info(
        title = "Conference Registration API",
        version = "1.0.0",
        description = "Registration pricing, eligibility and submission for the annual conference"
    )
)]
pub struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pricing: Arc<dyn PricingSource>,
    pub phases: PhaseResolver,
    pub registrations: RegistrationService,
    pub payments: PaymentService,
    pub tokens: TokenService,
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Handler for GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Creates and configures the application router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health_handler))
        // Pricing
        .route("/api/pricing/fees", get(pricing::handlers::fee_schedule_handler))
        .route("/api/pricing/packages", get(pricing::handlers::packages_handler))
        .route("/api/pricing/quote", post(pricing::handlers::quote_handler))
        // Registrations
        .route(
            "/api/registrations",
            post(registrations::handlers::submit_registration_handler),
        )
        .route(
            "/api/registrations/me",
            get(registrations::handlers::my_registration_handler),
        )
        .route(
            "/api/registrations/:id/checkout",
            post(payments::handlers::checkout_handler),
        )
        // Admin
        .route(
            "/api/admin/registrations",
            get(registrations::handlers::list_registrations_handler),
        )
        .route(
            "/api/admin/registrations/:id/payment",
            patch(registrations::handlers::update_payment_status_handler),
        )
        .fallback(error::route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(error::panic_response))
                .layer(cors),
        )
        .with_state(state)
}
