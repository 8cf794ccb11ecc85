// Price Calculator
//
// Composes the package fee and the accompanying-person surcharge into a
// breakdown. Fee-table amounts are GST-inclusive; GST is shown by backing the
// pre-tax amount out of the inclusive fee, never added on top.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::pricing::{
    eligibility,
    error::{PricingError, PricingResult},
    fee_table::FeeTable,
    types::{BookingPhase, PackageType, UserCategory},
};

/// Flat charge per accompanying person, independent of category and phase
pub const ACCOMPANYING_PERSON_RATE: i64 = 7_000;

/// GST rate in percent
pub const GST_PERCENT: i64 = 18;

/// Read-only result of a price calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PriceBreakdown {
    pub category: UserCategory,
    pub phase: BookingPhase,
    pub package_type: PackageType,
    pub workshop_id: Option<String>,
    pub accompanying_count: u32,
    /// GST-inclusive package fee
    #[schema(value_type = String)]
    pub base_price: Decimal,
    /// Package fee with GST backed out
    #[schema(value_type = String)]
    pub pre_gst_amount: Decimal,
    #[schema(value_type = String)]
    pub gst: Decimal,
    #[schema(value_type = String)]
    pub workshop_surcharge: Decimal,
    #[schema(value_type = String)]
    pub combo_discount: Decimal,
    #[schema(value_type = String)]
    pub accompanying_surcharge: Decimal,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
}

/// Service for calculating registration prices
pub struct PriceCalculator;

impl PriceCalculator {
    /// Compute the breakdown for a selection
    ///
    /// Re-checks eligibility and fails with `IneligibleSelection` when the
    /// package is not selectable. Negative accompanying counts are rejected.
    pub fn compute_breakdown(
        table: &FeeTable,
        category: UserCategory,
        phase: BookingPhase,
        package: PackageType,
        workshop_id: Option<&str>,
        accompanying_count: i32,
        course_capacity_remaining: i64,
    ) -> PricingResult<PriceBreakdown> {
        let accompanying_count = u32::try_from(accompanying_count)
            .map_err(|_| PricingError::NegativeAccompanyingCount(accompanying_count))?;

        let base_price = eligibility::check_package(
            table,
            category,
            phase,
            package,
            course_capacity_remaining,
        )
        .map_err(|reason| PricingError::IneligibleSelection {
            category,
            phase,
            package,
            reason,
        })?;

        let (pre_gst_amount, gst) = Self::split_gst(base_price);
        let accompanying_surcharge = Self::accompanying_surcharge(accompanying_count);

        Ok(PriceBreakdown {
            category,
            phase,
            package_type: package,
            workshop_id: workshop_id.map(str::to_string),
            accompanying_count,
            base_price,
            pre_gst_amount,
            gst,
            workshop_surcharge: Decimal::ZERO,
            combo_discount: Decimal::ZERO,
            accompanying_surcharge,
            total_amount: base_price + accompanying_surcharge,
        })
    }

    /// Split a GST-inclusive amount into (pre-GST, GST)
    ///
    /// The pre-GST part is rounded to paise, half away from zero; GST takes
    /// the remainder so both parts always sum to the inclusive amount.
    pub fn split_gst(inclusive: Decimal) -> (Decimal, Decimal) {
        let divisor = Decimal::from(100 + GST_PERCENT) / Decimal::from(100);
        let pre_gst = (inclusive / divisor)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        (pre_gst, inclusive - pre_gst)
    }

    /// Surcharge for accompanying persons
    pub fn accompanying_surcharge(count: u32) -> Decimal {
        Decimal::from(count) * Decimal::from(ACCOMPANYING_PERSON_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn quote(
        category: UserCategory,
        phase: BookingPhase,
        package: PackageType,
        accompanying: i32,
    ) -> PricingResult<PriceBreakdown> {
        let workshop = package.requires_workshop().then_some("WS-01");
        PriceCalculator::compute_breakdown(
            &FeeTable::standard(),
            category,
            phase,
            package,
            workshop,
            accompanying,
            40,
        )
    }

    #[test]
    fn test_non_member_early_bird_combo_with_companion() {
        let breakdown = quote(
            UserCategory::NonAoa,
            BookingPhase::EarlyBird,
            PackageType::Combo,
            1,
        )
        .unwrap();

        assert_eq!(breakdown.base_price, dec!(16000));
        assert_eq!(breakdown.accompanying_surcharge, dec!(7000));
        assert_eq!(breakdown.total_amount, dec!(23000));
        assert_eq!(breakdown.workshop_id.as_deref(), Some("WS-01"));
    }

    #[test]
    fn test_member_regular_conference_only() {
        let breakdown = quote(
            UserCategory::AoaMember,
            BookingPhase::Regular,
            PackageType::ConferenceOnly,
            0,
        )
        .unwrap();

        assert_eq!(breakdown.total_amount, dec!(10000));
        assert_eq!(breakdown.pre_gst_amount, dec!(8474.58));
        assert_eq!(breakdown.gst, dec!(1525.42));
    }

    #[test]
    fn test_pgs_spot_scenarios() {
        let conference = quote(
            UserCategory::PgsFellow,
            BookingPhase::Spot,
            PackageType::ConferenceOnly,
            0,
        )
        .unwrap();
        assert_eq!(conference.total_amount, dec!(12000));

        let combo = quote(UserCategory::PgsFellow, BookingPhase::Spot, PackageType::Combo, 0);
        assert!(matches!(
            combo,
            Err(PricingError::IneligibleSelection { package: PackageType::Combo, .. })
        ));
    }

    #[test]
    fn test_negative_accompanying_count_is_rejected() {
        let result = quote(
            UserCategory::NonAoa,
            BookingPhase::Regular,
            PackageType::ConferenceOnly,
            -1,
        );
        assert!(matches!(result, Err(PricingError::NegativeAccompanyingCount(-1))));
    }

    #[test]
    fn test_accompanying_allowed_for_course() {
        let breakdown = quote(
            UserCategory::AoaMember,
            BookingPhase::EarlyBird,
            PackageType::AoaCertifiedCourseOnly,
            2,
        )
        .unwrap();
        assert_eq!(breakdown.total_amount, dec!(19000));
    }

    #[test]
    fn test_full_course_is_ineligible() {
        let result = PriceCalculator::compute_breakdown(
            &FeeTable::standard(),
            UserCategory::AoaMember,
            BookingPhase::Regular,
            PackageType::AoaCertifiedCourseOnly,
            None,
            0,
            0,
        );
        assert!(matches!(result, Err(PricingError::IneligibleSelection { .. })));
    }

    #[test]
    fn test_split_gst_rounds_half_away_from_zero() {
        assert_eq!(PriceCalculator::split_gst(dec!(16000)), (dec!(13559.32), dec!(2440.68)));
        assert_eq!(PriceCalculator::split_gst(dec!(0)), (dec!(0), dec!(0)));
        // 1.77 / 1.18 = 1.5 exactly
        assert_eq!(PriceCalculator::split_gst(dec!(1.77)), (dec!(1.50), dec!(0.27)));
    }

    #[test]
    fn test_surcharge_and_discount_are_zero() {
        let breakdown = quote(
            UserCategory::AoaMember,
            BookingPhase::EarlyBird,
            PackageType::WorkshopConference,
            0,
        )
        .unwrap();
        assert_eq!(breakdown.workshop_surcharge, Decimal::ZERO);
        assert_eq!(breakdown.combo_discount, Decimal::ZERO);
    }
}
