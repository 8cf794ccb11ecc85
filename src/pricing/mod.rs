// Conference pricing module
//
// Pure pricing rules (fee table, booking phases, eligibility, price
// breakdown) plus the pricing collaborator and its HTTP endpoints.

pub mod calculator;
pub mod eligibility;
pub mod error;
pub mod fee_table;
pub mod handlers;
pub mod phase;
pub mod store;
pub mod types;

// Re-export commonly used types for convenience
pub use calculator::{PriceBreakdown, PriceCalculator, ACCOMPANYING_PERSON_RATE, GST_PERCENT};
pub use eligibility::{available_packages, check_package, package_availability, PackageAvailability};
pub use error::{PricingError, PricingResult};
pub use fee_table::{FeeTable, FeeTableEntry};
pub use phase::{Clock, PhaseCalendar, PhaseResolver};
pub use store::{
    PgPricingStore, PricingSnapshot, PricingSource, StaticPricingSource, Workshop,
    AOA_COURSE_CAPACITY, COURSE_CAPACITY_KEY,
};
pub use types::{BookingPhase, PackageType, UnavailableReason, UserCategory};
