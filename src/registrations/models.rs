use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::pricing::{BookingPhase, PackageType, UserCategory};

/// Payment state of a registration
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Pending,
        PaymentStatus::Paid,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ];

    /// Convert payment status to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }

    /// Whether the registration still holds its seat and blocks a new one
    pub fn is_active(&self) -> bool {
        !matches!(self, PaymentStatus::Refunded)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(PaymentStatus::Pending),
            "PAID" => Ok(PaymentStatus::Paid),
            "FAILED" => Ok(PaymentStatus::Failed),
            "REFUNDED" => Ok(PaymentStatus::Refunded),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

/// Metadata of an uploaded supporting document
///
/// The file itself is held by the upload service; only what is needed to
/// check the type and size travels with the registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SupportingDocument {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
}

/// Category-specific applicant details
///
/// A PGS fellow cannot be represented without the college letter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicantDetails {
    AoaMember { membership_number: String },
    NonAoa,
    PgsFellow { college_letter: SupportingDocument },
}

impl ApplicantDetails {
    pub fn category(&self) -> UserCategory {
        match self {
            ApplicantDetails::AoaMember { .. } => UserCategory::AoaMember,
            ApplicantDetails::NonAoa => UserCategory::NonAoa,
            ApplicantDetails::PgsFellow { .. } => UserCategory::PgsFellow,
        }
    }

    pub fn membership_number(&self) -> Option<&str> {
        match self {
            ApplicantDetails::AoaMember { membership_number } => Some(membership_number),
            _ => None,
        }
    }

    pub fn document(&self) -> Option<&SupportingDocument> {
        match self {
            ApplicantDetails::PgsFellow { college_letter } => Some(college_letter),
            _ => None,
        }
    }
}

/// What the attendee has picked so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RegistrationSelection {
    pub package_type: Option<PackageType>,
    pub selected_workshop_id: Option<String>,
    pub accompanying_count: u32,
}

/// Accompanying persons allowed on one registration
pub const MAX_ACCOMPANYING_PERSONS: u32 = 10;

/// Request DTO for submitting a registration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitRegistrationRequest {
    pub package_type: Option<PackageType>,
    pub selected_workshop_id: Option<String>,
    #[serde(default)]
    #[validate(range(
        min = 0,
        max = 10,
        message = "Accompanying person count must be between 0 and 10"
    ))]
    pub accompanying_count: i32,
    /// Required for association members
    pub membership_number: Option<String>,
    /// College letter, required for PGS fellows
    pub supporting_document: Option<SupportingDocument>,
}

/// Fully validated registration, ready to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub user_id: String,
    pub email: String,
    pub applicant: ApplicantDetails,
    /// Edition the registration is for; prefixes the registration number
    pub conference_year: i32,
    pub phase: BookingPhase,
    pub package_type: PackageType,
    pub workshop_id: Option<String>,
    pub accompanying_count: i32,
    pub total_amount: Decimal,
}

impl NewRegistration {
    pub fn category(&self) -> UserCategory {
        self.applicant.category()
    }

    /// Whether persisting this registration consumes a course seat
    pub fn takes_course_seat(&self) -> bool {
        self.package_type.is_course()
    }
}

/// Persisted registration record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Registration {
    pub id: Uuid,
    /// Human-facing number issued by the store, e.g. `AOA2024-00042`
    pub registration_number: String,
    pub user_id: String,
    pub email: String,
    pub category: UserCategory,
    pub phase: BookingPhase,
    pub package_type: PackageType,
    pub workshop_id: Option<String>,
    pub accompanying_count: i32,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub payment_reference: Option<String>,
    pub membership_number: Option<String>,
    pub document_name: Option<String>,
    pub document_content_type: Option<String>,
    pub document_size_bytes: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for updating payment status
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentRequest {
    pub payment_status: PaymentStatus,
    pub payment_reference: Option<String>,
}

/// Query parameters for the admin registration list
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct RegistrationListQuery {
    /// Optional payment status filter
    pub payment_status: Option<PaymentStatus>,
}
