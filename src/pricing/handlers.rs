// HTTP handlers for pricing endpoints

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AuthenticatedUser;
use crate::pricing::{
    calculator::{PriceBreakdown, PriceCalculator, ACCOMPANYING_PERSON_RATE, GST_PERCENT},
    eligibility::{package_availability, PackageAvailability},
    error::PricingError,
    fee_table::FeeTableEntry,
    store::Workshop,
    types::{BookingPhase, PackageType, UserCategory},
};
use crate::AppState;

/// Message shown when no package can be selected
pub const NO_PACKAGES_MESSAGE: &str = "No packages available";

/// Published fee schedule
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FeeScheduleResponse {
    pub current_phase: BookingPhase,
    pub entries: Vec<FeeTableEntry>,
    #[schema(value_type = String)]
    pub accompanying_person_rate: Decimal,
    pub gst_percent: i64,
}

/// Packages the caller can choose from right now
#[derive(Debug, Serialize, ToSchema)]
pub struct PackagesResponse {
    pub category: UserCategory,
    pub phase: BookingPhase,
    pub course_capacity_remaining: i64,
    pub packages: Vec<PackageAvailability>,
    pub workshops: Vec<Workshop>,
    /// Present when every package is withdrawn
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Request DTO for a price quote
#[derive(Debug, Deserialize, ToSchema)]
pub struct QuoteRequest {
    pub package_type: PackageType,
    pub workshop_id: Option<String>,
    #[serde(default)]
    pub accompanying_count: i32,
}

/// Handler for GET /api/pricing/fees
#[utoipa::path(
    get,
    path = "/api/pricing/fees",
    responses(
        (status = 200, description = "Fee schedule", body = FeeScheduleResponse),
        (status = 503, description = "Pricing unavailable")
    ),
    tag = "pricing"
)]
pub async fn fee_schedule_handler(
    State(state): State<AppState>,
) -> Result<Json<FeeScheduleResponse>, PricingError> {
    let snapshot = state.pricing.snapshot().await?;

    Ok(Json(FeeScheduleResponse {
        current_phase: state.phases.current_phase(),
        entries: snapshot.fee_table.entries(),
        accompanying_person_rate: Decimal::from(ACCOMPANYING_PERSON_RATE),
        gst_percent: GST_PERCENT,
    }))
}

/// Handler for GET /api/pricing/packages
/// Lists every package with its availability for the caller's category
#[utoipa::path(
    get,
    path = "/api/pricing/packages",
    responses(
        (status = 200, description = "Package availability", body = PackagesResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    tag = "pricing"
)]
pub async fn packages_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<PackagesResponse>, PricingError> {
    let snapshot = state.pricing.snapshot().await?;
    let phase = state.phases.current_phase();

    let packages = package_availability(
        &snapshot.fee_table,
        user.category,
        phase,
        snapshot.course_capacity_remaining,
    );
    let message = if packages.iter().any(|p| p.available) {
        None
    } else {
        tracing::warn!("No packages available for {} during {}", user.category, phase);
        Some(NO_PACKAGES_MESSAGE.to_string())
    };

    Ok(Json(PackagesResponse {
        category: user.category,
        phase,
        course_capacity_remaining: snapshot.course_capacity_remaining,
        packages,
        workshops: snapshot.workshops,
        message,
    }))
}

/// Handler for POST /api/pricing/quote
/// Computes the price breakdown for a selection without persisting anything
#[utoipa::path(
    post,
    path = "/api/pricing/quote",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Price breakdown", body = PriceBreakdown),
        (status = 400, description = "Negative accompanying count"),
        (status = 409, description = "Package not available")
    ),
    tag = "pricing"
)]
pub async fn quote_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<PriceBreakdown>, PricingError> {
    let snapshot = state.pricing.snapshot().await?;
    let phase = state.phases.current_phase();

    let breakdown = PriceCalculator::compute_breakdown(
        &snapshot.fee_table,
        user.category,
        phase,
        request.package_type,
        request.workshop_id.as_deref(),
        request.accompanying_count,
        snapshot.course_capacity_remaining,
    )?;

    tracing::debug!(
        "Quoted {} for {} during {}: {}",
        breakdown.package_type,
        user.category,
        phase,
        breakdown.total_amount
    );
    Ok(Json(breakdown))
}
