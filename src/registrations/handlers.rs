// HTTP handlers for registration endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::{AdminUser, AuthenticatedUser};
use crate::registrations::{
    Registration, RegistrationError, RegistrationListQuery, SubmitRegistrationRequest,
    UpdatePaymentRequest,
};
use crate::AppState;

/// Handler for POST /api/registrations
/// Submits a registration for the authenticated user
#[utoipa::path(
    post,
    path = "/api/registrations",
    request_body = SubmitRegistrationRequest,
    responses(
        (status = 201, description = "Registration created", body = Registration),
        (status = 400, description = "Field validation failed"),
        (status = 409, description = "Selection unavailable or already registered"),
        (status = 503, description = "Temporary failure, safe to retry")
    ),
    tag = "registrations"
)]
pub async fn submit_registration_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<SubmitRegistrationRequest>,
) -> Result<(StatusCode, Json<Registration>), RegistrationError> {
    tracing::debug!("Registration submitted by {}", user.user_id);

    let registration = state.registrations.submit(&user, request).await?;

    Ok((StatusCode::CREATED, Json(registration)))
}

/// Handler for GET /api/registrations/me
#[utoipa::path(
    get,
    path = "/api/registrations/me",
    responses(
        (status = 200, description = "Caller's registration", body = Registration),
        (status = 404, description = "No registration yet")
    ),
    tag = "registrations"
)]
pub async fn my_registration_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Registration>, RegistrationError> {
    let registration = state.registrations.find_for_user(&user.user_id).await?;
    Ok(Json(registration))
}

/// Handler for GET /api/admin/registrations
/// Lists registrations for the admin console
#[utoipa::path(
    get,
    path = "/api/admin/registrations",
    params(RegistrationListQuery),
    responses(
        (status = 200, description = "Registrations, newest first", body = Vec<Registration>),
        (status = 403, description = "Admin role required")
    ),
    tag = "admin"
)]
pub async fn list_registrations_handler(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Query(query): Query<RegistrationListQuery>,
) -> Result<Json<Vec<Registration>>, RegistrationError> {
    tracing::debug!(
        "Admin {} listing registrations (filter: {:?})",
        admin.user_id,
        query.payment_status
    );

    let registrations = state.registrations.list(query.payment_status).await?;
    Ok(Json(registrations))
}

/// Handler for PATCH /api/admin/registrations/{id}/payment
/// Records a payment outcome reported out of band (gateway dashboard, bank transfer)
#[utoipa::path(
    patch,
    path = "/api/admin/registrations/{id}/payment",
    params(
        ("id" = Uuid, Path, description = "Registration ID")
    ),
    request_body = UpdatePaymentRequest,
    responses(
        (status = 200, description = "Payment status updated", body = Registration),
        (status = 400, description = "Transition not allowed"),
        (status = 404, description = "Registration not found")
    ),
    tag = "admin"
)]
pub async fn update_payment_status_handler(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePaymentRequest>,
) -> Result<Json<Registration>, RegistrationError> {
    let registration = state
        .registrations
        .update_payment_status(
            id,
            request.payment_status,
            request.payment_reference,
            &admin.user_id,
        )
        .await?;

    Ok(Json(registration))
}
