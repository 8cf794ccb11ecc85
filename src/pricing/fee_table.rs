// Fee Table
//
// Static fee configuration keyed by (category, phase, package). Amounts are
// GST-inclusive rupees; a missing cell means the package is not offered.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::pricing::{
    error::{PricingError, PricingResult},
    types::{BookingPhase, PackageType, UserCategory},
};

type FeeKey = (UserCategory, BookingPhase, PackageType);

/// Single spot-registration rate
const SPOT_RATE: i64 = 12_000;

/// One configured fee cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FeeTableEntry {
    pub category: UserCategory,
    pub phase: BookingPhase,
    pub package_type: PackageType,
    /// GST-inclusive amount in rupees
    #[schema(value_type = String, example = "10000")]
    pub amount: Decimal,
}

/// Fee table loaded once per registration session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeeTable {
    cells: HashMap<FeeKey, Decimal>,
}

impl FeeTable {
    /// Build a table from configured entries
    ///
    /// Rejects negative amounts and duplicate cells.
    pub fn from_entries(entries: impl IntoIterator<Item = FeeTableEntry>) -> PricingResult<Self> {
        let mut cells = HashMap::new();

        for entry in entries {
            if entry.amount < Decimal::ZERO {
                return Err(PricingError::InvalidConfiguration(format!(
                    "negative fee {} for {}/{}/{}",
                    entry.amount, entry.category, entry.phase, entry.package_type
                )));
            }

            let key = (entry.category, entry.phase, entry.package_type);
            if cells.insert(key, entry.amount).is_some() {
                return Err(PricingError::InvalidConfiguration(format!(
                    "duplicate fee for {}/{}/{}",
                    entry.category, entry.phase, entry.package_type
                )));
            }
        }

        Ok(Self { cells })
    }

    /// The published fee schedule
    pub fn standard() -> Self {
        use BookingPhase::*;
        use PackageType::*;
        use UserCategory::*;

        let rows: [(UserCategory, BookingPhase, PackageType, i64); 23] = [
            (AoaMember, EarlyBird, ConferenceOnly, 8_000),
            (AoaMember, EarlyBird, WorkshopConference, 10_000),
            (AoaMember, EarlyBird, Combo, 14_000),
            (AoaMember, EarlyBird, AoaCertifiedCourseOnly, 5_000),
            (AoaMember, Regular, ConferenceOnly, 10_000),
            (AoaMember, Regular, WorkshopConference, 12_000),
            (AoaMember, Regular, Combo, 16_000),
            (AoaMember, Regular, AoaCertifiedCourseOnly, 6_000),
            (NonAoa, EarlyBird, ConferenceOnly, 10_000),
            (NonAoa, EarlyBird, WorkshopConference, 12_000),
            (NonAoa, EarlyBird, Combo, 16_000),
            (NonAoa, EarlyBird, AoaCertifiedCourseOnly, 6_000),
            (NonAoa, Regular, ConferenceOnly, 12_000),
            (NonAoa, Regular, WorkshopConference, 14_000),
            (NonAoa, Regular, Combo, 18_000),
            (NonAoa, Regular, AoaCertifiedCourseOnly, 7_000),
            (PgsFellow, EarlyBird, ConferenceOnly, 6_000),
            (PgsFellow, EarlyBird, WorkshopConference, 8_000),
            (PgsFellow, EarlyBird, Combo, 12_000),
            (PgsFellow, Regular, ConferenceOnly, 8_000),
            (PgsFellow, Regular, WorkshopConference, 10_000),
            (PgsFellow, Regular, Combo, 14_000),
            // Spot registrations are conference-only at a single rate
            (AoaMember, Spot, ConferenceOnly, SPOT_RATE),
        ];

        let mut cells: HashMap<FeeKey, Decimal> = rows
            .into_iter()
            .map(|(category, phase, package, amount)| {
                ((category, phase, package), Decimal::from(amount))
            })
            .collect();
        for category in [NonAoa, PgsFellow] {
            cells.insert((category, Spot, ConferenceOnly), Decimal::from(SPOT_RATE));
        }

        Self { cells }
    }

    /// GST-inclusive amount for a cell, `None` when not offered
    pub fn lookup(
        &self,
        category: UserCategory,
        phase: BookingPhase,
        package: PackageType,
    ) -> Option<Decimal> {
        self.cells.get(&(category, phase, package)).copied()
    }

    /// All entries in a stable order (category, phase, package)
    pub fn entries(&self) -> Vec<FeeTableEntry> {
        let mut entries: Vec<FeeTableEntry> = self
            .cells
            .iter()
            .map(|(&(category, phase, package_type), &amount)| FeeTableEntry {
                category,
                phase,
                package_type,
                amount,
            })
            .collect();
        entries.sort_by_key(|e| (e.category, e.phase, e.package_type));
        entries
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
