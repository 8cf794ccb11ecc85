// Payment Gateway
//
// Payment collaborator: opens a hosted checkout for a registration total.
// The HTTP client speaks JSON to the gateway; the sandbox gateway answers
// locally for development and tests.

use axum::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::payments::error::PaymentError;
use crate::registrations::Registration;

/// All fees are charged in rupees
pub const CURRENCY: &str = "INR";

/// What is sent to the gateway
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutRequest {
    pub registration_id: Uuid,
    pub registration_number: String,
    pub amount: Decimal,
    pub currency: String,
    pub customer_email: String,
}

impl CheckoutRequest {
    /// Charge exactly the persisted total
    pub fn for_registration(registration: &Registration) -> Self {
        Self {
            registration_id: registration.id,
            registration_number: registration.registration_number.clone(),
            amount: registration.total_amount,
            currency: CURRENCY.to_string(),
            customer_email: registration.email.clone(),
        }
    }
}

/// Hosted checkout opened by the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CheckoutSession {
    pub checkout_id: String,
    pub checkout_url: String,
    /// Amount the gateway will charge, echoed back for reconciliation
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub currency: String,
}

/// Payment gateway trait
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession, PaymentError>;
}

/// JSON-over-HTTP gateway client
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpPaymentGateway {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PaymentError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(PaymentError::Configuration(
                "PAYMENT_GATEWAY_API_KEY is empty".to_string(),
            ));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession, PaymentError> {
        let url = format!("{}/checkouts", self.base_url);
        debug!(
            "Opening checkout for {} ({} {})",
            request.registration_number, request.amount, request.currency
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Idempotency-Key", request.registration_id.to_string())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("Payment gateway error: {} - {}", status, body);
            return Err(PaymentError::Gateway {
                status: status.as_u16(),
                body,
            });
        }

        let session: CheckoutSession = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse checkout response: {}", e);
            PaymentError::InvalidResponse(e.to_string())
        })?;

        info!(
            "Checkout {} opened for {}",
            session.checkout_id, request.registration_number
        );
        Ok(session)
    }
}

/// Local gateway that opens checkouts without any network call
#[derive(Debug, Default)]
pub struct SandboxPaymentGateway {
    echo_amount: Option<Decimal>,
    calls: AtomicUsize,
}

impl SandboxPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway that reports `amount` regardless of what it was asked to charge
    pub fn misreporting(amount: Decimal) -> Self {
        Self {
            echo_amount: Some(amount),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for SandboxPaymentGateway {
    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession, PaymentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let checkout_id = format!("sandbox_chk_{}", Uuid::new_v4().simple());

        info!(
            checkout_id = %checkout_id,
            registration = %request.registration_number,
            amount = %request.amount,
            "Sandbox checkout opened"
        );

        Ok(CheckoutSession {
            checkout_url: format!("https://sandbox.payments.invalid/checkout/{}", checkout_id),
            checkout_id,
            amount: self.echo_amount.unwrap_or(request.amount),
            currency: request.currency.clone(),
        })
    }
}
