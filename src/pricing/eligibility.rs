// Eligibility Filter
//
// Decides which packages an attendee may select for a category and booking
// phase. Never fails: an empty set is a valid answer.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;
use utoipa::ToSchema;

use crate::pricing::{
    fee_table::FeeTable,
    types::{BookingPhase, PackageType, UnavailableReason, UserCategory},
};

/// Availability of one package, with the reason when it is withdrawn
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PackageAvailability {
    pub package_type: PackageType,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnavailableReason>,
    /// GST-inclusive fee, present only for available packages
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub amount: Option<Decimal>,
}

/// Check a single package against the eligibility rules
///
/// Rules are applied in order and the first failing rule names the reason:
/// 1. the certified course is never open to PGS fellows
/// 2. the certified course closes when no seats remain
/// 3. spot registration only offers conference-only
/// 4. cells missing from the fee table (or priced at zero) are withdrawn
pub fn check_package(
    table: &FeeTable,
    category: UserCategory,
    phase: BookingPhase,
    package: PackageType,
    course_capacity_remaining: i64,
) -> Result<Decimal, UnavailableReason> {
    let is_course = package.is_course();

    if is_course && category == UserCategory::PgsFellow {
        return Err(UnavailableReason::NotEligibleForCategory);
    }

    if is_course && course_capacity_remaining <= 0 {
        return Err(UnavailableReason::CourseFull);
    }

    if phase == BookingPhase::Spot && package != PackageType::ConferenceOnly {
        return Err(UnavailableReason::NotOfferedInPhase);
    }

    match table.lookup(category, phase, package) {
        Some(amount) if amount > Decimal::ZERO => Ok(amount),
        _ => Err(UnavailableReason::NotInFeeTable),
    }
}

/// Packages selectable for a category in a phase
pub fn available_packages(
    table: &FeeTable,
    category: UserCategory,
    phase: BookingPhase,
    course_capacity_remaining: i64,
) -> BTreeSet<PackageType> {
    PackageType::ALL
        .into_iter()
        .filter(|&package| {
            check_package(table, category, phase, package, course_capacity_remaining).is_ok()
        })
        .collect()
}

/// Every package with its availability, for rendering the selection form
pub fn package_availability(
    table: &FeeTable,
    category: UserCategory,
    phase: BookingPhase,
    course_capacity_remaining: i64,
) -> Vec<PackageAvailability> {
    PackageType::ALL
        .into_iter()
        .map(|package| {
            match check_package(table, category, phase, package, course_capacity_remaining) {
                Ok(amount) => PackageAvailability {
                    package_type: package,
                    available: true,
                    reason: None,
                    amount: Some(amount),
                },
                Err(reason) => PackageAvailability {
                    package_type: package,
                    available: false,
                    reason: Some(reason),
                    amount: None,
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn category_strategy() -> impl Strategy<Value = UserCategory> {
        prop::sample::select(UserCategory::ALL.to_vec())
    }

    fn phase_strategy() -> impl Strategy<Value = BookingPhase> {
        prop::sample::select(BookingPhase::ALL.to_vec())
    }

    #[test]
    fn test_all_packages_open_for_members_in_early_bird() {
        let table = FeeTable::standard();
        let packages = available_packages(&table, UserCategory::AoaMember, BookingPhase::EarlyBird, 40);
        assert_eq!(packages.len(), 4);
    }

    #[test]
    fn test_pgs_fellow_is_not_eligible_for_course() {
        let table = FeeTable::standard();
        let result = check_package(
            &table,
            UserCategory::PgsFellow,
            BookingPhase::EarlyBird,
            PackageType::AoaCertifiedCourseOnly,
            40,
        );
        assert_eq!(result, Err(UnavailableReason::NotEligibleForCategory));
    }

    #[test]
    fn test_full_course_is_distinct_from_ineligible() {
        let table = FeeTable::standard();
        for phase in [BookingPhase::EarlyBird, BookingPhase::Regular] {
            let result = check_package(
                &table,
                UserCategory::AoaMember,
                phase,
                PackageType::AoaCertifiedCourseOnly,
                0,
            );
            assert_eq!(result, Err(UnavailableReason::CourseFull));
        }
    }

    #[test]
    fn test_zero_capacity_removes_course_in_every_phase() {
        let table = FeeTable::standard();
        for phase in BookingPhase::ALL {
            let packages = available_packages(&table, UserCategory::AoaMember, phase, 0);
            assert!(!packages.contains(&PackageType::AoaCertifiedCourseOnly));
        }
    }

    #[test]
    fn test_pgs_spot_scenario() {
        let table = FeeTable::standard();
        let packages = available_packages(&table, UserCategory::PgsFellow, BookingPhase::Spot, 40);
        assert_eq!(packages, BTreeSet::from([PackageType::ConferenceOnly]));

        let combo = check_package(
            &table,
            UserCategory::PgsFellow,
            BookingPhase::Spot,
            PackageType::Combo,
            40,
        );
        assert_eq!(combo, Err(UnavailableReason::NotOfferedInPhase));
    }

    #[test]
    fn test_empty_table_yields_empty_set() {
        let table = FeeTable::default();
        let packages = available_packages(&table, UserCategory::NonAoa, BookingPhase::Regular, 40);
        assert!(packages.is_empty());

        let listing = package_availability(&table, UserCategory::NonAoa, BookingPhase::Regular, 40);
        assert!(listing.iter().all(|p| p.reason == Some(UnavailableReason::NotInFeeTable)));
    }

    #[test]
    fn test_package_availability_lists_every_package() {
        let table = FeeTable::standard();
        let listing = package_availability(&table, UserCategory::PgsFellow, BookingPhase::Regular, 40);
        assert_eq!(listing.len(), PackageType::ALL.len());

        let course = listing
            .iter()
            .find(|p| p.package_type == PackageType::AoaCertifiedCourseOnly)
            .unwrap();
        assert!(!course.available);
        assert_eq!(course.amount, None);
    }

    proptest! {
        #[test]
        fn prop_pgs_never_sees_course(phase in phase_strategy(), capacity in -5i64..=100) {
            let table = FeeTable::standard();
            let packages = available_packages(&table, UserCategory::PgsFellow, phase, capacity);
            prop_assert!(!packages.contains(&PackageType::AoaCertifiedCourseOnly));
        }

        #[test]
        fn prop_spot_is_conference_only(category in category_strategy(), capacity in -5i64..=100) {
            let table = FeeTable::standard();
            let packages = available_packages(&table, category, BookingPhase::Spot, capacity);
            prop_assert!(packages.iter().all(|p| *p == PackageType::ConferenceOnly));
        }

        #[test]
        fn prop_listing_agrees_with_set(
            category in category_strategy(),
            phase in phase_strategy(),
            capacity in -5i64..=100,
        ) {
            let table = FeeTable::standard();
            let set = available_packages(&table, category, phase, capacity);
            let listed: BTreeSet<PackageType> = package_availability(&table, category, phase, capacity)
                .into_iter()
                .filter(|p| p.available)
                .map(|p| p.package_type)
                .collect();
            prop_assert_eq!(set, listed);
        }
    }
}
