use axum::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::pricing::{StaticPricingSource, COURSE_CAPACITY_KEY};
use crate::registrations::{
    error::RegistrationError, NewRegistration, PaymentStatus, Registration,
};

const REGISTRATION_COLUMNS: &str = r#"
    id, registration_number, user_id, email, category, phase, package_type, workshop_id,
    accompanying_count, total_amount, payment_status, payment_reference, membership_number,
    document_name, document_content_type, document_size_bytes, created_at, updated_at
"#;

/// Registration number shown to attendees, e.g. `AOA2024-00042`
pub fn format_registration_number(year: i32, sequence: i64) -> String {
    format!("AOA{}-{:05}", year, sequence)
}

/// Registration-persistence collaborator
///
/// Owns registration numbers and the course seat counter: a store must
/// check-and-decrement the seat atomically with the insert, and must refuse
/// a second active registration for the same user.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Persist a validated registration and issue its registration number
    async fn create(&self, registration: NewRegistration) -> Result<Registration, RegistrationError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Registration>, RegistrationError>;

    /// Most recent registration of a user, active or not
    async fn find_latest_for_user(
        &self,
        user_id: &str,
    ) -> Result<Option<Registration>, RegistrationError>;

    /// All registrations, newest first, with optional payment status filter
    async fn list(
        &self,
        payment_status: Option<PaymentStatus>,
    ) -> Result<Vec<Registration>, RegistrationError>;

    /// Move a registration from `from` to `to`
    ///
    /// Fails with `InvalidTransition` when the stored status is no longer
    /// `from`. Refunding a course registration gives its seat back.
    async fn update_payment_status(
        &self,
        id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
        payment_reference: Option<String>,
    ) -> Result<Registration, RegistrationError>;
}

fn course_full() -> RegistrationError {
    RegistrationError::Ineligible("The certified course is full".to_string())
}

fn concurrent_update(id: Uuid, expected: PaymentStatus) -> RegistrationError {
    RegistrationError::InvalidTransition(format!(
        "Registration {} is no longer {}",
        id, expected
    ))
}

/// PostgreSQL-backed registration store
#[derive(Clone)]
pub struct PgRegistrationStore {
    pool: PgPool,
}

impl PgRegistrationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_insert_error(err: sqlx::Error) -> RegistrationError {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return RegistrationError::AlreadyRegistered;
            }
            if let Some(mapped) = db_err.code().and_then(|code| insert_error_for_code(&code)) {
                tracing::warn!("Registration insert refused by the database: {}", db_err);
                return mapped;
            }
        }
        err.into()
    }
}

/// Classify an insert failure by SQLSTATE
///
/// Constraint and range failures will fail the same way on every retry, so
/// they are reported as request errors rather than transient ones.
fn insert_error_for_code(code: &str) -> Option<RegistrationError> {
    match code {
        // unique_violation
        "23505" => Some(RegistrationError::AlreadyRegistered),
        // check_violation, numeric_value_out_of_range
        "23514" | "22003" => Some(RegistrationError::validation(
            "request",
            "Registration values are out of the accepted range",
        )),
        _ => None,
    }
}

#[async_trait]
impl RegistrationStore for PgRegistrationStore {
    async fn create(&self, registration: NewRegistration) -> Result<Registration, RegistrationError> {
        let mut tx = self.pool.begin().await?;

        if registration.takes_course_seat() {
            // Check-and-decrement in one statement; no row back means full
            let remaining: Option<i32> = sqlx::query_scalar(
                r#"
                UPDATE course_capacity
                SET remaining = remaining - 1
                WHERE course = $1 AND remaining > 0
                RETURNING remaining
                "#,
            )
            .bind(COURSE_CAPACITY_KEY)
            .fetch_optional(&mut *tx)
            .await?;

            match remaining {
                Some(left) => tracing::info!("Course seat taken, {} remaining", left),
                None => return Err(course_full()),
            }
        }

        let sequence: i64 = sqlx::query_scalar("SELECT nextval('registration_number_seq')")
            .fetch_one(&mut *tx)
            .await?;
        let registration_number =
            format_registration_number(registration.conference_year, sequence);
        let document = registration.applicant.document();

        let sql = format!(
            r#"
            INSERT INTO registrations (
                registration_number, user_id, email, category, phase, package_type, workshop_id,
                accompanying_count, total_amount, payment_status, membership_number,
                document_name, document_content_type, document_size_bytes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        );
        let record = sqlx::query_as::<_, Registration>(&sql)
            .bind(&registration_number)
            .bind(&registration.user_id)
            .bind(&registration.email)
            .bind(registration.category())
            .bind(registration.phase)
            .bind(registration.package_type)
            .bind(&registration.workshop_id)
            .bind(registration.accompanying_count)
            .bind(registration.total_amount)
            .bind(PaymentStatus::Pending)
            .bind(registration.applicant.membership_number())
            .bind(document.map(|d| d.file_name.as_str()))
            .bind(document.map(|d| d.content_type.as_str()))
            .bind(document.map(|d| d.size_bytes))
            .fetch_one(&mut *tx)
            .await
            .map_err(Self::map_insert_error)?;

        tx.commit().await?;

        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Registration>, RegistrationError> {
        let sql = format!("SELECT {} FROM registrations WHERE id = $1", REGISTRATION_COLUMNS);
        let registration = sqlx::query_as::<_, Registration>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(registration)
    }

    async fn find_latest_for_user(
        &self,
        user_id: &str,
    ) -> Result<Option<Registration>, RegistrationError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM registrations
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            REGISTRATION_COLUMNS
        );
        let registration = sqlx::query_as::<_, Registration>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(registration)
    }

    async fn list(
        &self,
        payment_status: Option<PaymentStatus>,
    ) -> Result<Vec<Registration>, RegistrationError> {
        let registrations = match payment_status {
            Some(status_filter) => {
                let sql = format!(
                    r#"
                    SELECT {}
                    FROM registrations
                    WHERE payment_status = $1
                    ORDER BY created_at DESC
                    "#,
                    REGISTRATION_COLUMNS
                );
                sqlx::query_as::<_, Registration>(&sql)
                    .bind(status_filter)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM registrations ORDER BY created_at DESC",
                    REGISTRATION_COLUMNS
                );
                sqlx::query_as::<_, Registration>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(registrations)
    }

    async fn update_payment_status(
        &self,
        id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
        payment_reference: Option<String>,
    ) -> Result<Registration, RegistrationError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            UPDATE registrations
            SET payment_status = $1,
                payment_reference = COALESCE($2, payment_reference),
                updated_at = NOW()
            WHERE id = $3 AND payment_status = $4
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        );
        let updated = sqlx::query_as::<_, Registration>(&sql)
            .bind(to)
            .bind(&payment_reference)
            .bind(id)
            .bind(from)
            .fetch_optional(&mut *tx)
            .await?;

        let registration = match updated {
            Some(registration) => registration,
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM registrations WHERE id = $1)")
                        .bind(id)
                        .fetch_one(&mut *tx)
                        .await?;
                return Err(if exists {
                    concurrent_update(id, from)
                } else {
                    RegistrationError::NotFound
                });
            }
        };

        if to == PaymentStatus::Refunded && from != to && registration.package_type.is_course() {
            sqlx::query("UPDATE course_capacity SET remaining = remaining + 1 WHERE course = $1")
                .bind(COURSE_CAPACITY_KEY)
                .execute(&mut *tx)
                .await?;
            tracing::info!("Course seat released by refund of {}", registration.registration_number);
        }

        tx.commit().await?;

        Ok(registration)
    }
}

/// In-memory registration store
///
/// Takes course seats through the in-memory pricing source when one is
/// attached, so capacity seen by pricing and by the store stays in step.
pub struct InMemoryRegistrationStore {
    registrations: RwLock<Vec<Registration>>,
    next_sequence: AtomicI64,
    seats: Option<Arc<StaticPricingSource>>,
    create_calls: AtomicUsize,
}

impl InMemoryRegistrationStore {
    pub fn new() -> Self {
        Self {
            registrations: RwLock::new(Vec::new()),
            next_sequence: AtomicI64::new(1),
            seats: None,
            create_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_course_seats(seats: Arc<StaticPricingSource>) -> Self {
        Self {
            seats: Some(seats),
            ..Self::new()
        }
    }

    /// Number of create attempts received, successful or not
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryRegistrationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistrationStore for InMemoryRegistrationStore {
    async fn create(&self, registration: NewRegistration) -> Result<Registration, RegistrationError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut registrations = self.registrations.write().await;

        let already_active = registrations
            .iter()
            .any(|r| r.user_id == registration.user_id && r.payment_status.is_active());
        if already_active {
            return Err(RegistrationError::AlreadyRegistered);
        }

        if registration.takes_course_seat() {
            if let Some(seats) = &self.seats {
                if !seats.try_take_course_seat().await {
                    return Err(course_full());
                }
            }
        }

        let now = Utc::now();
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let document = registration.applicant.document().cloned();
        let record = Registration {
            id: Uuid::new_v4(),
            registration_number: format_registration_number(registration.conference_year, sequence),
            user_id: registration.user_id.clone(),
            email: registration.email.clone(),
            category: registration.category(),
            phase: registration.phase,
            package_type: registration.package_type,
            workshop_id: registration.workshop_id.clone(),
            accompanying_count: registration.accompanying_count,
            total_amount: registration.total_amount,
            payment_status: PaymentStatus::Pending,
            payment_reference: None,
            membership_number: registration.applicant.membership_number().map(str::to_string),
            document_name: document.as_ref().map(|d| d.file_name.clone()),
            document_content_type: document.as_ref().map(|d| d.content_type.clone()),
            document_size_bytes: document.as_ref().map(|d| d.size_bytes),
            created_at: now,
            updated_at: now,
        };

        registrations.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Registration>, RegistrationError> {
        let registrations = self.registrations.read().await;
        Ok(registrations.iter().find(|r| r.id == id).cloned())
    }

    async fn find_latest_for_user(
        &self,
        user_id: &str,
    ) -> Result<Option<Registration>, RegistrationError> {
        let registrations = self.registrations.read().await;
        // Insertion order doubles as creation order
        Ok(registrations.iter().rev().find(|r| r.user_id == user_id).cloned())
    }

    async fn list(
        &self,
        payment_status: Option<PaymentStatus>,
    ) -> Result<Vec<Registration>, RegistrationError> {
        let registrations = self.registrations.read().await;
        Ok(registrations
            .iter()
            .rev()
            .filter(|r| payment_status.map_or(true, |status| r.payment_status == status))
            .cloned()
            .collect())
    }

    async fn update_payment_status(
        &self,
        id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
        payment_reference: Option<String>,
    ) -> Result<Registration, RegistrationError> {
        let mut registrations = self.registrations.write().await;
        let registration = registrations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(RegistrationError::NotFound)?;

        if registration.payment_status != from {
            return Err(concurrent_update(id, from));
        }

        registration.payment_status = to;
        if payment_reference.is_some() {
            registration.payment_reference = payment_reference;
        }
        registration.updated_at = Utc::now();

        if to == PaymentStatus::Refunded && from != to && registration.package_type.is_course() {
            if let Some(seats) = &self.seats {
                seats.release_course_seat().await;
            }
        }

        Ok(registration.clone())
    }
}
