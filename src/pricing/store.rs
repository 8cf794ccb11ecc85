// Pricing Store
//
// Pricing collaborator: supplies the fee table, the workshop catalog and the
// remaining certified-course capacity. The PostgreSQL store caches the fee
// table and catalog for 60 seconds; capacity is always read fresh because it
// changes with every course registration.

use axum::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::pricing::{
    error::PricingResult,
    fee_table::{FeeTable, FeeTableEntry},
};

/// Time-to-live for the cached fee table and catalog (60 seconds)
const CACHE_TTL: Duration = Duration::from_secs(60);

/// Seat cap of the certified course
pub const AOA_COURSE_CAPACITY: i64 = 40;

/// Row key of the certified course in `course_capacity`
pub const COURSE_CAPACITY_KEY: &str = "AOA_CERTIFIED_COURSE";

/// Workshop offered alongside the conference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Workshop {
    pub id: String,
    pub title: String,
}

/// Everything the pricing rules need for one registration session
#[derive(Debug, Clone, PartialEq)]
pub struct PricingSnapshot {
    pub fee_table: FeeTable,
    pub course_capacity_remaining: i64,
    pub workshops: Vec<Workshop>,
}

impl PricingSnapshot {
    pub fn has_workshop(&self, workshop_id: &str) -> bool {
        self.workshops.iter().any(|w| w.id == workshop_id)
    }
}

/// Source of pricing data
#[async_trait]
pub trait PricingSource: Send + Sync {
    /// Load the fee table, catalog and current course capacity
    async fn snapshot(&self) -> PricingResult<PricingSnapshot>;
}

/// In-memory pricing source seeded with the published fee schedule
///
/// Also owns the course seat counter for the in-memory registration store,
/// which takes and releases seats through it.
pub struct StaticPricingSource {
    snapshot: RwLock<PricingSnapshot>,
    snapshot_calls: AtomicUsize,
}

impl StaticPricingSource {
    pub fn new(snapshot: PricingSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
            snapshot_calls: AtomicUsize::new(0),
        }
    }

    /// Standard fee table, full course capacity and the default catalog
    pub fn standard(course_capacity: i64) -> Self {
        Self::new(PricingSnapshot {
            fee_table: FeeTable::standard(),
            course_capacity_remaining: course_capacity,
            workshops: default_workshops(),
        })
    }

    pub async fn set_course_capacity(&self, remaining: i64) {
        self.snapshot.write().await.course_capacity_remaining = remaining;
    }

    /// Check-and-decrement one course seat; `false` when the course is full
    pub async fn try_take_course_seat(&self) -> bool {
        let mut snapshot = self.snapshot.write().await;
        if snapshot.course_capacity_remaining <= 0 {
            return false;
        }
        snapshot.course_capacity_remaining -= 1;
        true
    }

    pub async fn release_course_seat(&self) {
        self.snapshot.write().await.course_capacity_remaining += 1;
    }

    /// Number of snapshots served so far
    pub fn snapshot_calls(&self) -> usize {
        self.snapshot_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PricingSource for StaticPricingSource {
    async fn snapshot(&self) -> PricingResult<PricingSnapshot> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot.read().await.clone())
    }
}

/// Workshops offered when no catalog is configured
pub fn default_workshops() -> Vec<Workshop> {
    [
        ("WS-ARTHRO", "Arthroscopy Skills Lab"),
        ("WS-TRAUMA", "Trauma Fixation Workshop"),
        ("WS-SPINE", "Spine Navigation Workshop"),
    ]
    .into_iter()
    .map(|(id, title)| Workshop {
        id: id.to_string(),
        title: title.to_string(),
    })
    .collect()
}

#[derive(Debug, Clone)]
struct CachedCatalog {
    fee_table: FeeTable,
    workshops: Vec<Workshop>,
    loaded_at: Instant,
}

/// PostgreSQL-backed pricing source
pub struct PgPricingStore {
    pool: PgPool,
    cache: Arc<RwLock<Option<CachedCatalog>>>,
    cache_ttl: Duration,
}

impl PgPricingStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            cache: Arc::new(RwLock::new(None)),
            cache_ttl: CACHE_TTL,
        }
    }

    /// Open the certified course with `capacity` seats unless it is already open
    ///
    /// An existing counter is never reset, so restarts keep the seats taken.
    pub async fn open_course(&self, capacity: i64) -> PricingResult<()> {
        let capacity = i32::try_from(capacity.max(0)).unwrap_or(i32::MAX);
        let result = sqlx::query(
            r#"
            INSERT INTO course_capacity (course, remaining)
            VALUES ($1, $2)
            ON CONFLICT (course) DO NOTHING
            "#,
        )
        .bind(COURSE_CAPACITY_KEY)
        .bind(capacity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            tracing::info!("Opened {} with {} seats", COURSE_CAPACITY_KEY, capacity);
        }
        Ok(())
    }

    async fn catalog(&self) -> PricingResult<CachedCatalog> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.loaded_at.elapsed() <= self.cache_ttl {
                    return Ok(cached.clone());
                }
            }
        }

        tracing::debug!("Loading fee table and workshop catalog from database");

        let entries = sqlx::query_as::<_, FeeTableEntry>(
            r#"
            SELECT category, phase, package_type, amount
            FROM fee_table
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        let fee_table = FeeTable::from_entries(entries)?;

        let workshops = sqlx::query_as::<_, Workshop>(
            r#"
            SELECT id, title
            FROM workshops
            WHERE is_active
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let catalog = CachedCatalog {
            fee_table,
            workshops,
            loaded_at: Instant::now(),
        };
        *self.cache.write().await = Some(catalog.clone());

        tracing::info!(
            "Loaded {} fee entries and {} workshops",
            catalog.fee_table.len(),
            catalog.workshops.len()
        );
        Ok(catalog)
    }

    async fn course_capacity_remaining(&self) -> PricingResult<i64> {
        let remaining: Option<i32> =
            sqlx::query_scalar("SELECT remaining FROM course_capacity WHERE course = $1")
                .bind(COURSE_CAPACITY_KEY)
                .fetch_optional(&self.pool)
                .await?;

        // No row means the course was never opened
        Ok(remaining.map(i64::from).unwrap_or(0))
    }
}

#[async_trait]
impl PricingSource for PgPricingStore {
    async fn snapshot(&self) -> PricingResult<PricingSnapshot> {
        let catalog = self.catalog().await?;
        let course_capacity_remaining = self.course_capacity_remaining().await?;

        Ok(PricingSnapshot {
            fee_table: catalog.fee_table,
            course_capacity_remaining,
            workshops: catalog.workshops,
        })
    }
}
