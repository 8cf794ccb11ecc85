// Payments module
//
// Gateway collaborator and the checkout flow that hands a registration's
// persisted total to it.

pub mod error;
pub mod gateway;
pub mod handlers;
pub mod service;

pub use error::PaymentError;
pub use gateway::{
    CheckoutRequest, CheckoutSession, HttpPaymentGateway, PaymentGateway, SandboxPaymentGateway,
    CURRENCY,
};
pub use service::{reconcile, CheckoutResponse, PaymentService};
