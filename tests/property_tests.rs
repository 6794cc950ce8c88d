//! Property-based tests for the stock and validation invariants.

use chrono::{Duration, TimeZone, Utc};
use medistock::{
    commands::medicines::plan_adjustment,
    errors::StockError,
    models::{Medicine, StockStatus},
    validation::{validate_thresholds, InventoryPolicy},
    PaginatedResponse,
};
use proptest::prelude::*;
use uuid::Uuid;

fn medicine(current: i32, max: i32, warning: i32, critical: i32) -> Medicine {
    let now = Utc::now();
    Medicine {
        id: Uuid::new_v4(),
        user_id: "user-1".to_string(),
        name: "Paracétamol".to_string(),
        description: None,
        dosage: None,
        form: None,
        reference: None,
        unit: "boîte".to_string(),
        current_quantity: current,
        max_quantity: max,
        warning_threshold: warning,
        critical_threshold: critical,
        expiry_date: None,
        aisle_id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
    }
}

// Strategies for generating test data
fn stocked_medicine() -> impl Strategy<Value = Medicine> {
    (1i32..1_000)
        .prop_flat_map(|max| (Just(max), 0..=max, 1..=max))
        .prop_flat_map(|(max, current, warning)| {
            (Just(max), Just(current), Just(warning), 0..warning)
        })
        .prop_map(|(max, current, warning, critical)| medicine(current, max, warning, critical))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn thresholds_accepted_iff_critical_below_warning(critical in 0i32..500, warning in 0i32..500) {
        let result = validate_thresholds(critical, warning);
        prop_assert_eq!(result.is_ok(), critical < warning);
    }

    #[test]
    fn adjustments_never_leave_negative_stock(med in stocked_medicine(), adjustment in -2_000i32..2_000) {
        let permissive = InventoryPolicy {
            block_withdrawal_below_critical: false,
            ..InventoryPolicy::default()
        };
        match plan_adjustment(&med, adjustment, &permissive) {
            Ok(change) => {
                prop_assert!(change.new_quantity >= 0);
                prop_assert!(change.new_quantity <= med.max_quantity);
                prop_assert_eq!(change.old_quantity, med.current_quantity);
                prop_assert_eq!(change.new_quantity, med.current_quantity + adjustment);
            }
            Err(StockError::ZeroAdjustment) => prop_assert_eq!(adjustment, 0),
            Err(StockError::Negative { .. }) => prop_assert!(med.current_quantity + adjustment < 0),
            Err(StockError::ExceedsMaximum { .. }) => {
                prop_assert!(med.current_quantity + adjustment > med.max_quantity)
            }
            Err(other) => prop_assert!(false, "unexpected refusal: {:?}", other),
        }
    }

    #[test]
    fn default_policy_keeps_withdrawals_at_or_above_critical(med in stocked_medicine(), withdrawal in 1i32..1_000) {
        if let Ok(change) = plan_adjustment(&med, -withdrawal, &InventoryPolicy::default()) {
            prop_assert!(change.new_quantity >= med.critical_threshold);
        }
    }

    #[test]
    fn stock_status_follows_thresholds(med in stocked_medicine()) {
        let expected = if med.current_quantity <= med.critical_threshold {
            StockStatus::Critical
        } else if med.current_quantity <= med.warning_threshold {
            StockStatus::Warning
        } else {
            StockStatus::Normal
        };
        prop_assert_eq!(med.stock_status(), expected);
    }

    #[test]
    fn expiry_flags_match_their_windows(offset_hours in -2_000i64..2_000) {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut med = medicine(10, 100, 20, 5);
        let expiry = now + Duration::hours(offset_hours);
        med.expiry_date = Some(expiry);

        prop_assert_eq!(med.is_expired_at(now), expiry <= now);
        prop_assert_eq!(med.is_expiring_soon_at(now, 30), expiry <= now + Duration::days(30));
        if med.is_expired_at(now) {
            prop_assert!(med.is_expiring_soon_at(now, 30));
        }
    }

    #[test]
    fn pages_partition_the_list(len in 0usize..300, limit in 1u64..50) {
        let items: Vec<usize> = (0..len).collect();
        let first = PaginatedResponse::from_items(items.clone(), 1, limit);
        let mut seen = Vec::new();
        for page in 1..=first.total_pages.max(1) {
            seen.extend(PaginatedResponse::from_items(items.clone(), page, limit).items);
        }
        prop_assert_eq!(seen, items);
        prop_assert_eq!(first.total, len as u64);
    }
}
