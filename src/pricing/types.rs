// Domain type definitions for conference pricing
// Shared by the fee table, phase resolver, eligibility filter and calculator

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Attendee category assigned when the user account is created
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserCategory {
    /// Member of the association
    AoaMember,

    /// Delegate who is not a member
    NonAoa,

    /// Post-graduate student or fellow
    PgsFellow,
}

impl UserCategory {
    pub const ALL: [UserCategory; 3] = [
        UserCategory::AoaMember,
        UserCategory::NonAoa,
        UserCategory::PgsFellow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserCategory::AoaMember => "AOA_MEMBER",
            UserCategory::NonAoa => "NON_AOA",
            UserCategory::PgsFellow => "PGS_FELLOW",
        }
    }
}

impl fmt::Display for UserCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AOA_MEMBER" => Ok(UserCategory::AoaMember),
            "NON_AOA" => Ok(UserCategory::NonAoa),
            "PGS_FELLOW" => Ok(UserCategory::PgsFellow),
            _ => Err(format!("Invalid user category: {}", s)),
        }
    }
}

/// Product the attendee is purchasing
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackageType {
    /// Conference access only
    ConferenceOnly,

    /// Conference access plus one workshop
    WorkshopConference,

    /// Conference, workshop and lifetime membership bundle
    Combo,

    /// Standalone certified course, capacity limited
    AoaCertifiedCourseOnly,
}

impl PackageType {
    pub const ALL: [PackageType; 4] = [
        PackageType::ConferenceOnly,
        PackageType::WorkshopConference,
        PackageType::Combo,
        PackageType::AoaCertifiedCourseOnly,
    ];

    /// Whether a workshop must be chosen alongside this package
    pub fn requires_workshop(&self) -> bool {
        matches!(self, PackageType::WorkshopConference | PackageType::Combo)
    }

    /// Whether this package consumes a certified-course seat
    pub fn is_course(&self) -> bool {
        matches!(self, PackageType::AoaCertifiedCourseOnly)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::ConferenceOnly => "CONFERENCE_ONLY",
            PackageType::WorkshopConference => "WORKSHOP_CONFERENCE",
            PackageType::Combo => "COMBO",
            PackageType::AoaCertifiedCourseOnly => "AOA_CERTIFIED_COURSE_ONLY",
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PackageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONFERENCE_ONLY" => Ok(PackageType::ConferenceOnly),
            "WORKSHOP_CONFERENCE" => Ok(PackageType::WorkshopConference),
            "COMBO" => Ok(PackageType::Combo),
            "AOA_CERTIFIED_COURSE_ONLY" => Ok(PackageType::AoaCertifiedCourseOnly),
            _ => Err(format!("Invalid package type: {}", s)),
        }
    }
}

/// Time-window pricing tier
///
/// Never stored; always derived from the calendar date.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingPhase {
    EarlyBird,
    Regular,
    Spot,
}

impl BookingPhase {
    pub const ALL: [BookingPhase; 3] = [
        BookingPhase::EarlyBird,
        BookingPhase::Regular,
        BookingPhase::Spot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingPhase::EarlyBird => "EARLY_BIRD",
            BookingPhase::Regular => "REGULAR",
            BookingPhase::Spot => "SPOT",
        }
    }
}

impl fmt::Display for BookingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EARLY_BIRD" => Ok(BookingPhase::EarlyBird),
            "REGULAR" => Ok(BookingPhase::Regular),
            "SPOT" => Ok(BookingPhase::Spot),
            _ => Err(format!("Invalid booking phase: {}", s)),
        }
    }
}

/// Why a package cannot be selected
///
/// "Course full" is kept apart from "not eligible" so the client can
/// explain the difference to the attendee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnavailableReason {
    /// The attendee category may never buy this package
    NotEligibleForCategory,

    /// The certified course has no seats left
    CourseFull,

    /// The package is withdrawn in the current booking phase
    NotOfferedInPhase,

    /// No fee is configured for this combination
    NotInFeeTable,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::NotEligibleForCategory => {
                write!(f, "not available for this attendee category")
            }
            UnavailableReason::CourseFull => write!(f, "the certified course is full"),
            UnavailableReason::NotOfferedInPhase => {
                write!(f, "not offered in the current booking phase")
            }
            UnavailableReason::NotInFeeTable => write!(f, "no fee is configured"),
        }
    }
}
