use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::payments::error::PaymentError;
use crate::payments::gateway::{CheckoutRequest, CheckoutSession, PaymentGateway, CURRENCY};
use crate::registrations::{PaymentStatus, PaymentStatusMachine, RegistrationService};

/// Response for a successfully opened checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CheckoutResponse {
    pub registration_id: Uuid,
    pub registration_number: String,
    pub checkout_id: String,
    pub checkout_url: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub currency: String,
    pub payment_status: PaymentStatus,
}

/// Hands registration totals to the payment gateway
#[derive(Clone)]
pub struct PaymentService {
    registrations: RegistrationService,
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentService {
    pub fn new(registrations: RegistrationService, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            registrations,
            gateway,
        }
    }

    /// Open a checkout for the caller's registration
    ///
    /// The gateway is asked to charge the persisted total, never a recomputed
    /// one. A failed payment goes back to PENDING when a new checkout opens.
    pub async fn checkout(
        &self,
        registration_id: Uuid,
        user: &AuthenticatedUser,
    ) -> Result<CheckoutResponse, PaymentError> {
        let registration = self.registrations.get_owned(registration_id, user).await?;

        if !PaymentStatusMachine::can_checkout(registration.payment_status) {
            tracing::warn!(
                "Checkout refused for {} in status {}",
                registration.registration_number,
                registration.payment_status
            );
            return Err(PaymentError::CheckoutNotAllowed(registration.payment_status));
        }

        let request = CheckoutRequest::for_registration(&registration);
        let session = self.gateway.create_checkout(&request).await?;
        reconcile(registration.total_amount, &session)?;

        let updated = self
            .registrations
            .update_payment_status(
                registration.id,
                PaymentStatus::Pending,
                Some(session.checkout_id.clone()),
                &user.user_id,
            )
            .await?;

        tracing::info!(
            "Checkout {} opened for {} ({} {})",
            session.checkout_id,
            updated.registration_number,
            session.amount,
            session.currency
        );

        Ok(CheckoutResponse {
            registration_id: updated.id,
            registration_number: updated.registration_number,
            checkout_id: session.checkout_id,
            checkout_url: session.checkout_url,
            amount: session.amount,
            currency: session.currency,
            payment_status: updated.payment_status,
        })
    }
}

/// The gateway must echo back exactly what was registered
pub fn reconcile(expected: Decimal, session: &CheckoutSession) -> Result<(), PaymentError> {
    if session.currency != CURRENCY {
        return Err(PaymentError::InvalidResponse(format!(
            "Unexpected currency {}",
            session.currency
        )));
    }
    if session.amount != expected {
        return Err(PaymentError::AmountMismatch {
            expected,
            charged: session.amount,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::payments::gateway::SandboxPaymentGateway;
    use crate::pricing::{
        BookingPhase, Clock, PackageType, PhaseCalendar, PhaseResolver, StaticPricingSource,
        UserCategory,
    };
    use crate::registrations::{
        AuditLogger, InMemoryRegistrationStore, Registration, RegistrationError,
        SubmitRegistrationRequest,
    };
    use rust_decimal_macros::dec;

    fn attendee(id: &str) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: id.to_string(),
            email: format!("{}@example.com", id),
            category: UserCategory::NonAoa,
            role: Role::Attendee,
        }
    }

    fn registrations() -> RegistrationService {
        let pricing = Arc::new(StaticPricingSource::standard(40));
        let store = Arc::new(InMemoryRegistrationStore::with_course_seats(pricing.clone()));
        RegistrationService::new(
            store,
            pricing,
            PhaseResolver::new(PhaseCalendar::new(2024), Clock::System),
            AuditLogger::log_only(),
        )
    }

    async fn registered(registrations: &RegistrationService, user: &AuthenticatedUser) -> Registration {
        let request = SubmitRegistrationRequest {
            package_type: Some(PackageType::Combo),
            selected_workshop_id: Some("WS-TRAUMA".to_string()),
            accompanying_count: 1,
            ..Default::default()
        };
        registrations
            .submit_in_phase(user, request, BookingPhase::EarlyBird)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_checkout_charges_registered_total() {
        let registrations = registrations();
        let gateway = Arc::new(SandboxPaymentGateway::new());
        let service = PaymentService::new(registrations.clone(), gateway.clone());
        let user = attendee("u-1");
        let registration = registered(&registrations, &user).await;

        let response = service.checkout(registration.id, &user).await.unwrap();

        assert_eq!(response.amount, dec!(23000));
        assert_eq!(response.currency, "INR");
        assert_eq!(response.payment_status, PaymentStatus::Pending);
        assert_eq!(gateway.calls(), 1);

        let stored = registrations.find_for_user("u-1").await.unwrap();
        assert_eq!(stored.payment_reference.as_deref(), Some(response.checkout_id.as_str()));
    }

    #[tokio::test]
    async fn test_mismatched_amount_is_rejected() {
        let registrations = registrations();
        let service = PaymentService::new(
            registrations.clone(),
            Arc::new(SandboxPaymentGateway::misreporting(dec!(16000))),
        );
        let user = attendee("u-1");
        let registration = registered(&registrations, &user).await;

        let err = service.checkout(registration.id, &user).await.unwrap_err();
        assert!(matches!(
            err,
            PaymentError::AmountMismatch { expected, charged }
                if expected == dec!(23000) && charged == dec!(16000)
        ));

        let stored = registrations.find_for_user("u-1").await.unwrap();
        assert_eq!(stored.payment_reference, None);
    }

    #[tokio::test]
    async fn test_paid_registration_cannot_checkout_again() {
        let registrations = registrations();
        let gateway = Arc::new(SandboxPaymentGateway::new());
        let service = PaymentService::new(registrations.clone(), gateway.clone());
        let user = attendee("u-1");
        let registration = registered(&registrations, &user).await;

        registrations
            .update_payment_status(registration.id, PaymentStatus::Paid, Some("bank-1".into()), "admin")
            .await
            .unwrap();

        let err = service.checkout(registration.id, &user).await.unwrap_err();
        assert!(matches!(err, PaymentError::CheckoutNotAllowed(PaymentStatus::Paid)));
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_payment_reopens_as_pending() {
        let registrations = registrations();
        let service = PaymentService::new(registrations.clone(), Arc::new(SandboxPaymentGateway::new()));
        let user = attendee("u-1");
        let registration = registered(&registrations, &user).await;

        registrations
            .update_payment_status(registration.id, PaymentStatus::Failed, None, "admin")
            .await
            .unwrap();

        let response = service.checkout(registration.id, &user).await.unwrap();
        assert_eq!(response.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_other_attendee_cannot_checkout() {
        let registrations = registrations();
        let gateway = Arc::new(SandboxPaymentGateway::new());
        let service = PaymentService::new(registrations.clone(), gateway.clone());
        let registration = registered(&registrations, &attendee("u-1")).await;

        let err = service
            .checkout(registration.id, &attendee("u-2"))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Registration(RegistrationError::Forbidden(_))));
        assert_eq!(gateway.calls(), 0);
    }

    #[test]
    fn test_reconcile_rejects_foreign_currency() {
        let session = CheckoutSession {
            checkout_id: "chk_1".to_string(),
            checkout_url: "https://pay/chk_1".to_string(),
            amount: dec!(10000),
            currency: "USD".to_string(),
        };
        assert!(matches!(
            reconcile(dec!(10000), &session),
            Err(PaymentError::InvalidResponse(_))
        ));
    }
}
