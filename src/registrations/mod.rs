// Registration module
//
// Submission orchestration, persistence collaborator, payment status
// machine, per-attendee session state and the audit trail.

pub mod audit;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod session;
pub mod status_machine;

pub use audit::AuditLogger;
pub use error::RegistrationError;
pub use models::*;
pub use repository::{
    format_registration_number, InMemoryRegistrationStore, PgRegistrationStore, RegistrationStore,
};
pub use service::{check_submission, CheckedSelection, RegistrationService};
pub use session::{RegistrationSession, SubmissionOutcome, SubmissionTicket};
pub use status_machine::PaymentStatusMachine;
