// Registration session state
//
// Per-attendee selection state between loading the form and submitting it.
// State only changes through the action methods; every action recomputes the
// price breakdown. A submission ticket stays valid until the attendee leaves
// the form or the pricing data is replaced; results for older tickets are
// dropped.

use std::collections::BTreeSet;

use crate::pricing::{
    available_packages, BookingPhase, PackageType, PriceBreakdown, PriceCalculator,
    PricingSnapshot, UserCategory,
};
use crate::registrations::{
    error::RegistrationError, models::MAX_ACCOMPANYING_PERSONS, Registration,
    RegistrationSelection, SubmitRegistrationRequest, SupportingDocument,
};

/// Handle for one in-flight submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionTicket {
    generation: u64,
    pub request: SubmitRegistrationRequest,
}

impl SubmissionTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What happened to a completed submission
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Registered(Registration),
    /// The selection is kept so the attendee can resubmit as is
    Rejected { message: String, retryable: bool },
    /// The session moved on while the request was in flight
    Ignored,
}

#[derive(Debug, Clone)]
pub struct RegistrationSession {
    category: UserCategory,
    phase: BookingPhase,
    snapshot: PricingSnapshot,
    selection: RegistrationSelection,
    membership_number: Option<String>,
    supporting_document: Option<SupportingDocument>,
    breakdown: Option<PriceBreakdown>,
    generation: u64,
    pending: Option<SubmissionTicket>,
    registration: Option<Registration>,
    last_error: Option<String>,
}

impl RegistrationSession {
    pub fn new(category: UserCategory, phase: BookingPhase, snapshot: PricingSnapshot) -> Self {
        Self {
            category,
            phase,
            snapshot,
            selection: RegistrationSelection::default(),
            membership_number: None,
            supporting_document: None,
            breakdown: None,
            generation: 0,
            pending: None,
            registration: None,
            last_error: None,
        }
    }

    pub fn category(&self) -> UserCategory {
        self.category
    }

    pub fn phase(&self) -> BookingPhase {
        self.phase
    }

    pub fn selection(&self) -> &RegistrationSelection {
        &self.selection
    }

    /// Breakdown of the current selection, if it can be priced
    pub fn breakdown(&self) -> Option<&PriceBreakdown> {
        self.breakdown.as_ref()
    }

    pub fn registration(&self) -> Option<&Registration> {
        self.registration.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.pending.is_some()
    }

    /// Packages the attendee can pick right now
    pub fn available_packages(&self) -> BTreeSet<PackageType> {
        available_packages(
            &self.snapshot.fee_table,
            self.category,
            self.phase,
            self.snapshot.course_capacity_remaining,
        )
    }

    /// Choose a package; a workshop pick is dropped if the package has none
    pub fn select_package(&mut self, package: PackageType) {
        self.selection.package_type = Some(package);
        if !package.requires_workshop() {
            self.selection.selected_workshop_id = None;
        }
        self.changed();
    }

    pub fn select_workshop(&mut self, workshop_id: Option<String>) {
        self.selection.selected_workshop_id = workshop_id;
        self.changed();
    }

    /// Out-of-range counts are refused and leave the selection untouched
    pub fn set_accompanying_count(&mut self, count: i32) -> Result<(), RegistrationError> {
        let count = u32::try_from(count).map_err(|_| {
            RegistrationError::validation(
                "accompanying_count",
                "Accompanying person count cannot be negative",
            )
        })?;
        if count > MAX_ACCOMPANYING_PERSONS {
            return Err(RegistrationError::validation(
                "accompanying_count",
                format!("At most {} accompanying persons", MAX_ACCOMPANYING_PERSONS),
            ));
        }
        self.selection.accompanying_count = count;
        self.changed();
        Ok(())
    }

    pub fn set_membership_number(&mut self, membership_number: Option<String>) {
        self.membership_number = membership_number;
        self.changed();
    }

    pub fn attach_document(&mut self, document: Option<SupportingDocument>) {
        self.supporting_document = document;
        self.changed();
    }

    /// Replace the pricing data, e.g. after capacity changed or the phase rolled over
    pub fn refresh(&mut self, phase: BookingPhase, snapshot: PricingSnapshot) {
        self.phase = phase;
        self.snapshot = snapshot;
        self.invalidate();
        self.changed();
    }

    /// The attendee left the form; any in-flight result will be ignored
    pub fn abandon(&mut self) {
        self.invalidate();
    }

    /// Freeze the current selection into a request
    ///
    /// While a submission is in flight the same ticket is handed back, so
    /// the selection is never submitted twice.
    pub fn begin_submission(&mut self) -> SubmissionTicket {
        if let Some(ticket) = &self.pending {
            return ticket.clone();
        }

        self.generation += 1;
        self.last_error = None;
        let ticket = SubmissionTicket {
            generation: self.generation,
            request: self.to_request(),
        };
        self.pending = Some(ticket.clone());
        ticket
    }

    /// Apply a submission result, unless the session has moved on since
    pub fn complete_submission(
        &mut self,
        ticket: &SubmissionTicket,
        result: Result<Registration, RegistrationError>,
    ) -> SubmissionOutcome {
        let current = self.pending.as_ref().map(SubmissionTicket::generation);
        if current != Some(ticket.generation) {
            tracing::debug!(
                "Ignoring stale submission result (generation {} vs {:?})",
                ticket.generation,
                current
            );
            return SubmissionOutcome::Ignored;
        }

        self.pending = None;
        match result {
            Ok(registration) => {
                self.registration = Some(registration.clone());
                SubmissionOutcome::Registered(registration)
            }
            Err(err) => {
                let message = err.to_string();
                self.last_error = Some(message.clone());
                SubmissionOutcome::Rejected {
                    message,
                    retryable: err.is_retryable(),
                }
            }
        }
    }

    pub fn to_request(&self) -> SubmitRegistrationRequest {
        SubmitRegistrationRequest {
            package_type: self.selection.package_type,
            selected_workshop_id: self.selection.selected_workshop_id.clone(),
            accompanying_count: i32::try_from(self.selection.accompanying_count).unwrap_or(i32::MAX),
            membership_number: self.membership_number.clone(),
            supporting_document: self.supporting_document.clone(),
        }
    }

    fn changed(&mut self) {
        self.breakdown = self.price();
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.pending = None;
    }

    fn price(&self) -> Option<PriceBreakdown> {
        let package = self.selection.package_type?;
        if package.requires_workshop() && self.selection.selected_workshop_id.is_none() {
            return None;
        }
        let count = i32::try_from(self.selection.accompanying_count).ok()?;

        PriceCalculator::compute_breakdown(
            &self.snapshot.fee_table,
            self.category,
            self.phase,
            package,
            self.selection.selected_workshop_id.as_deref(),
            count,
            self.snapshot.course_capacity_remaining,
        )
        .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::StaticPricingSource;
    use crate::pricing::PricingSource;
    use crate::registrations::PaymentStatus;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    async fn session(category: UserCategory, phase: BookingPhase) -> RegistrationSession {
        let snapshot = StaticPricingSource::standard(40).snapshot().await.unwrap();
        RegistrationSession::new(category, phase, snapshot)
    }

    fn registration(total: rust_decimal::Decimal) -> Registration {
        Registration {
            id: Uuid::new_v4(),
            registration_number: "AOA2024-00001".to_string(),
            user_id: "u-1".to_string(),
            email: "u-1@example.com".to_string(),
            category: UserCategory::NonAoa,
            phase: BookingPhase::EarlyBird,
            package_type: PackageType::Combo,
            workshop_id: Some("WS-ARTHRO".to_string()),
            accompanying_count: 1,
            total_amount: total,
            payment_status: PaymentStatus::Pending,
            payment_reference: None,
            membership_number: None,
            document_name: None,
            document_content_type: None,
            document_size_bytes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_breakdown_follows_selection() {
        let mut s = session(UserCategory::NonAoa, BookingPhase::EarlyBird).await;
        assert!(s.breakdown().is_none());

        s.select_package(PackageType::Combo);
        assert!(s.breakdown().is_none(), "combo needs a workshop");

        s.select_workshop(Some("WS-ARTHRO".to_string()));
        s.set_accompanying_count(1).unwrap();
        assert_eq!(s.breakdown().unwrap().total_amount, dec!(23000));

        s.select_package(PackageType::ConferenceOnly);
        assert_eq!(s.selection().selected_workshop_id, None);
        assert_eq!(s.breakdown().unwrap().total_amount, dec!(17000));
    }

    #[tokio::test]
    async fn test_negative_count_keeps_previous_value() {
        let mut s = session(UserCategory::NonAoa, BookingPhase::Regular).await;
        s.set_accompanying_count(2).unwrap();

        let err = s.set_accompanying_count(-1).unwrap_err();
        assert!(matches!(err, RegistrationError::Validation { .. }));
        assert_eq!(s.selection().accompanying_count, 2);
    }

    #[tokio::test]
    async fn test_pgs_never_sees_the_course() {
        let s = session(UserCategory::PgsFellow, BookingPhase::EarlyBird).await;
        assert!(!s.available_packages().contains(&PackageType::AoaCertifiedCourseOnly));
    }

    #[tokio::test]
    async fn test_refresh_into_spot_withdraws_combo() {
        let mut s = session(UserCategory::NonAoa, BookingPhase::Regular).await;
        s.select_package(PackageType::Combo);
        s.select_workshop(Some("WS-SPINE".to_string()));
        assert!(s.breakdown().is_some());

        let snapshot = s.snapshot.clone();
        s.refresh(BookingPhase::Spot, snapshot);
        assert!(s.breakdown().is_none());
        assert_eq!(
            s.available_packages().into_iter().collect::<Vec<_>>(),
            vec![PackageType::ConferenceOnly]
        );
    }

    #[tokio::test]
    async fn test_completed_submission_is_applied() {
        let mut s = session(UserCategory::NonAoa, BookingPhase::EarlyBird).await;
        s.select_package(PackageType::ConferenceOnly);

        let ticket = s.begin_submission();
        assert!(s.is_submitting());
        assert_eq!(ticket.request.package_type, Some(PackageType::ConferenceOnly));

        let outcome = s.complete_submission(&ticket, Ok(registration(dec!(10000))));
        assert!(matches!(outcome, SubmissionOutcome::Registered(_)));
        assert!(!s.is_submitting());
        assert!(s.registration().is_some());
    }

    #[tokio::test]
    async fn test_result_after_abandon_is_ignored() {
        let mut s = session(UserCategory::NonAoa, BookingPhase::EarlyBird).await;
        s.select_package(PackageType::ConferenceOnly);

        let ticket = s.begin_submission();
        s.abandon();

        let outcome = s.complete_submission(&ticket, Ok(registration(dec!(10000))));
        assert_eq!(outcome, SubmissionOutcome::Ignored);
        assert!(s.registration().is_none());
    }

    #[tokio::test]
    async fn test_edit_during_submission_keeps_the_result() {
        let mut s = session(UserCategory::NonAoa, BookingPhase::EarlyBird).await;
        s.select_package(PackageType::ConferenceOnly);

        let first = s.begin_submission();
        s.set_accompanying_count(1).unwrap();
        assert!(s.is_submitting());

        let second = s.begin_submission();
        assert_eq!(second, first, "no second request while one is in flight");

        let outcome = s.complete_submission(&first, Ok(registration(dec!(10000))));
        assert!(matches!(outcome, SubmissionOutcome::Registered(_)));
        assert!(s.registration().is_some());
        assert!(!s.is_submitting());
    }

    #[tokio::test]
    async fn test_result_after_refresh_is_ignored() {
        let mut s = session(UserCategory::NonAoa, BookingPhase::EarlyBird).await;
        s.select_package(PackageType::ConferenceOnly);

        let ticket = s.begin_submission();
        let snapshot = s.snapshot.clone();
        s.refresh(BookingPhase::Regular, snapshot);

        let outcome = s.complete_submission(&ticket, Err(RegistrationError::Transient("timeout".into())));
        assert_eq!(outcome, SubmissionOutcome::Ignored);
        assert!(s.last_error().is_none());
    }

    #[tokio::test]
    async fn test_accompanying_count_has_upper_bound() {
        let mut s = session(UserCategory::NonAoa, BookingPhase::EarlyBird).await;
        s.set_accompanying_count(MAX_ACCOMPANYING_PERSONS as i32).unwrap();

        let err = s.set_accompanying_count(2_000_000_000).unwrap_err();
        assert!(matches!(err, RegistrationError::Validation { .. }));
        assert_eq!(s.selection().accompanying_count, MAX_ACCOMPANYING_PERSONS);
    }

    #[tokio::test]
    async fn test_transient_failure_keeps_selection_for_retry() {
        let mut s = session(UserCategory::NonAoa, BookingPhase::EarlyBird).await;
        s.select_package(PackageType::ConferenceOnly);
        s.set_accompanying_count(1).unwrap();

        let ticket = s.begin_submission();
        let outcome = s.complete_submission(&ticket, Err(RegistrationError::Transient("timeout".into())));

        assert!(matches!(outcome, SubmissionOutcome::Rejected { retryable: true, .. }));
        assert_eq!(s.selection().accompanying_count, 1);
        assert!(s.last_error().is_some());

        let retry = s.begin_submission();
        assert_eq!(retry.request, ticket.request);
        assert!(s.last_error().is_none());
    }
}
