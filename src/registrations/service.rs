// Registration Submission Orchestrator
//
// Runs the fail-fast submission checks, prices the selection against the
// current fee table and hands the result to the registration store. The
// store issues registration numbers and owns the course seat counter.

use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthenticatedUser, Role};
use crate::pricing::{BookingPhase, PackageType, PhaseResolver, PriceCalculator, PricingSource, UserCategory};
use crate::registrations::{
    audit::AuditLogger, error::RegistrationError, repository::RegistrationStore, ApplicantDetails,
    NewRegistration, PaymentStatus, PaymentStatusMachine, Registration, SubmitRegistrationRequest,
};
use crate::validation::{validate_document_size, validate_membership_number, validate_pdf};

/// Selection that passed every check needing no pricing data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedSelection {
    pub package_type: PackageType,
    pub workshop_id: Option<String>,
    pub accompanying_count: i32,
    pub applicant: ApplicantDetails,
}

/// Submission checks that run before any collaborator is called
///
/// Order matters, the first failure wins:
/// 1. a package is chosen
/// 2. a workshop is chosen when the package includes one
/// 3. PGS fellows attach a PDF college letter of at most 5 MB
///    (members give a membership number)
/// 4. the certified course is refused to PGS fellows
///
/// A negative accompanying count fails request validation before step 1.
pub fn check_submission(
    category: UserCategory,
    request: &SubmitRegistrationRequest,
) -> Result<CheckedSelection, RegistrationError> {
    request.validate()?;

    let package_type = request.package_type.ok_or_else(|| {
        RegistrationError::validation("package_type", "Select a registration package")
    })?;

    let workshop_id = if package_type.requires_workshop() {
        let workshop_id = request
            .selected_workshop_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                RegistrationError::validation(
                    "selected_workshop_id",
                    format!("Select a workshop for {}", package_type),
                )
            })?;
        Some(workshop_id.to_string())
    } else {
        None
    };

    let applicant = applicant_details(category, request)?;

    if package_type.is_course() && category == UserCategory::PgsFellow {
        return Err(RegistrationError::Ineligible(format!(
            "{} is not open to {}",
            package_type, category
        )));
    }

    Ok(CheckedSelection {
        package_type,
        workshop_id,
        accompanying_count: request.accompanying_count,
        applicant,
    })
}

/// Build the category-specific details, checking the fields each one needs
fn applicant_details(
    category: UserCategory,
    request: &SubmitRegistrationRequest,
) -> Result<ApplicantDetails, RegistrationError> {
    match category {
        UserCategory::PgsFellow => {
            let letter = request.supporting_document.clone().ok_or_else(|| {
                RegistrationError::validation(
                    "supporting_document",
                    "A college letter is required for PGS fellows",
                )
            })?;

            validate_pdf(&letter.file_name, &letter.content_type).map_err(|_| {
                RegistrationError::validation("supporting_document", "College letter must be a PDF")
            })?;
            validate_document_size(letter.size_bytes).map_err(|e| {
                let message = if e.code == "document_empty" {
                    "College letter is empty"
                } else {
                    "College letter must be at most 5 MB"
                };
                RegistrationError::validation("supporting_document", message)
            })?;

            Ok(ApplicantDetails::PgsFellow {
                college_letter: letter,
            })
        }
        UserCategory::AoaMember => {
            let number = request
                .membership_number
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| {
                    RegistrationError::validation(
                        "membership_number",
                        "Membership number is required for members",
                    )
                })?;

            validate_membership_number(number).map_err(|_| {
                RegistrationError::validation(
                    "membership_number",
                    "Membership number must be AOA followed by 3 to 6 digits",
                )
            })?;

            Ok(ApplicantDetails::AoaMember {
                membership_number: number.to_string(),
            })
        }
        UserCategory::NonAoa => Ok(ApplicantDetails::NonAoa),
    }
}

/// Service for registration business logic
#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn RegistrationStore>,
    pricing: Arc<dyn PricingSource>,
    phases: PhaseResolver,
    audit: AuditLogger,
}

impl RegistrationService {
    pub fn new(
        store: Arc<dyn RegistrationStore>,
        pricing: Arc<dyn PricingSource>,
        phases: PhaseResolver,
        audit: AuditLogger,
    ) -> Self {
        Self {
            store,
            pricing,
            phases,
            audit,
        }
    }

    /// Submit a registration in the current booking phase
    pub async fn submit(
        &self,
        user: &AuthenticatedUser,
        request: SubmitRegistrationRequest,
    ) -> Result<Registration, RegistrationError> {
        self.submit_in_phase(user, request, self.phases.current_phase())
            .await
    }

    /// Submit a registration priced in the given phase
    ///
    /// # Validation
    /// - `check_submission` runs first; nothing is fetched if it fails
    /// - the workshop must be in the current catalog
    /// - the fee cell must be offered and yield a positive total
    /// - course capacity is re-checked here, but the store has the final say
    pub async fn submit_in_phase(
        &self,
        user: &AuthenticatedUser,
        request: SubmitRegistrationRequest,
        phase: BookingPhase,
    ) -> Result<Registration, RegistrationError> {
        let checked = check_submission(user.category, &request).map_err(|e| {
            tracing::warn!("Rejected submission from {}: {}", user.user_id, e);
            e
        })?;

        let snapshot = self.pricing.snapshot().await?;

        if let Some(workshop_id) = &checked.workshop_id {
            if !snapshot.has_workshop(workshop_id) {
                return Err(RegistrationError::validation(
                    "selected_workshop_id",
                    format!("Unknown workshop: {}", workshop_id),
                ));
            }
        }

        let breakdown = PriceCalculator::compute_breakdown(
            &snapshot.fee_table,
            user.category,
            phase,
            checked.package_type,
            checked.workshop_id.as_deref(),
            checked.accompanying_count,
            snapshot.course_capacity_remaining,
        )
        .map_err(|e| {
            tracing::warn!("Selection no longer available for {}: {}", user.user_id, e);
            RegistrationError::from(e)
        })?;

        if breakdown.total_amount <= Decimal::ZERO {
            return Err(RegistrationError::Ineligible(format!(
                "{} is not offered during {}",
                checked.package_type, phase
            )));
        }

        let registration = self
            .store
            .create(NewRegistration {
                user_id: user.user_id.clone(),
                email: user.email.clone(),
                applicant: checked.applicant,
                conference_year: self.phases.calendar().year(),
                phase,
                package_type: checked.package_type,
                workshop_id: checked.workshop_id,
                accompanying_count: checked.accompanying_count,
                total_amount: breakdown.total_amount,
            })
            .await?;

        tracing::info!(
            "Registered {} as {} ({} {}, total {})",
            user.user_id,
            registration.registration_number,
            registration.category,
            registration.package_type,
            registration.total_amount
        );
        self.audit.log_submission(&registration).await;

        Ok(registration)
    }

    /// The caller's most recent registration
    pub async fn find_for_user(&self, user_id: &str) -> Result<Registration, RegistrationError> {
        self.store
            .find_latest_for_user(user_id)
            .await?
            .ok_or(RegistrationError::NotFound)
    }

    /// Fetch a registration the caller owns (admins may fetch any)
    pub async fn get_owned(
        &self,
        id: Uuid,
        user: &AuthenticatedUser,
    ) -> Result<Registration, RegistrationError> {
        let registration = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(RegistrationError::NotFound)?;

        if registration.user_id != user.user_id && user.role != Role::Admin {
            return Err(RegistrationError::Forbidden(
                "You do not have permission to access this registration".to_string(),
            ));
        }

        Ok(registration)
    }

    /// All registrations, optionally filtered by payment status
    pub async fn list(
        &self,
        payment_status: Option<PaymentStatus>,
    ) -> Result<Vec<Registration>, RegistrationError> {
        let registrations = self.store.list(payment_status).await?;
        tracing::debug!("Listed {} registrations", registrations.len());
        Ok(registrations)
    }

    /// Update payment status
    ///
    /// The transition must be allowed by `PaymentStatusMachine`.
    pub async fn update_payment_status(
        &self,
        id: Uuid,
        new_status: PaymentStatus,
        payment_reference: Option<String>,
        actor: &str,
    ) -> Result<Registration, RegistrationError> {
        let current = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(RegistrationError::NotFound)?;

        PaymentStatusMachine::transition(current.payment_status, new_status)
            .map_err(RegistrationError::InvalidTransition)?;

        let updated = self
            .store
            .update_payment_status(id, current.payment_status, new_status, payment_reference)
            .await?;

        if current.payment_status != new_status {
            tracing::info!(
                "Payment status of {} changed {} -> {}",
                updated.registration_number,
                current.payment_status,
                new_status
            );
            self.audit
                .log_payment_change(
                    id,
                    actor,
                    current.payment_status,
                    new_status,
                    updated.payment_reference.as_deref(),
                )
                .await;
        }

        Ok(updated)
    }
}
