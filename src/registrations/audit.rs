// Audit Logger
//
// Records submissions and payment status changes in `registration_audit`.
// Failures are logged and swallowed so auditing never blocks a registration.

use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use uuid::Uuid;

use crate::registrations::{PaymentStatus, Registration};

/// Audit Logger
///
/// Without a pool (in-memory deployments, tests) events only go to the log.
#[derive(Clone, Default)]
pub struct AuditLogger {
    pool: Option<PgPool>,
}

impl AuditLogger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Some(pool) }
    }

    /// Logger that writes to the tracing output only
    pub fn log_only() -> Self {
        Self { pool: None }
    }

    /// Log a successful submission
    pub async fn log_submission(&self, registration: &Registration) {
        let details = json!({
            "registration_number": registration.registration_number,
            "category": registration.category,
            "phase": registration.phase,
            "package_type": registration.package_type,
            "workshop_id": registration.workshop_id,
            "accompanying_count": registration.accompanying_count,
            "total_amount": registration.total_amount.to_string(),
        });

        self.record(registration.id, &registration.user_id, "SUBMITTED", details)
            .await;
    }

    /// Log a payment status change
    pub async fn log_payment_change(
        &self,
        registration_id: Uuid,
        actor: &str,
        from: PaymentStatus,
        to: PaymentStatus,
        payment_reference: Option<&str>,
    ) {
        let details = json!({
            "from": from,
            "to": to,
            "payment_reference": payment_reference,
        });

        self.record(registration_id, actor, "PAYMENT_STATUS_CHANGED", details)
            .await;
    }

    async fn record(&self, registration_id: Uuid, actor: &str, action: &str, details: JsonValue) {
        tracing::info!(
            registration_id = %registration_id,
            actor,
            action,
            %details,
            "Registration audit event"
        );

        if let Some(pool) = &self.pool {
            if let Err(e) = insert_audit_record(pool, registration_id, actor, action, &details).await {
                tracing::warn!("Failed to write audit record for {}: {}", registration_id, e);
            }
        }
    }
}

async fn insert_audit_record(
    pool: &PgPool,
    registration_id: Uuid,
    actor: &str,
    action: &str,
    details: &JsonValue,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO registration_audit (registration_id, actor, action, details)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(registration_id)
    .bind(actor)
    .bind(action)
    .bind(details)
    .execute(pool)
    .await?;

    Ok(())
}
