use devscope_inventory::{
    Context, ContextDistribution, DeviceRecord, OverlapMatrix, PresencePolicy,
    adjust_count_for_duplicates, normalize_presence, normalize_presence_column,
};
use proptest::prelude::*;

fn arb_record() -> impl Strategy<Value = DeviceRecord> {
    (any::<[bool; 5]>(), 0u8..6, 0u8..6, any::<bool>()).prop_map(
        |(presence, entra, sophos, multi_instance)| DeviceRecord {
            row: 0,
            presence,
            entra_instances: f64::from(entra),
            sophos_instances: f64::from(sophos),
            multi_instance,
        },
    )
}

fn arb_policy() -> impl Strategy<Value = PresencePolicy> {
    prop_oneof![Just(PresencePolicy::Legacy), Just(PresencePolicy::Absent)]
}

/// A recognized marker in random case with surrounding whitespace, and its value.
fn arb_recognized_marker() -> impl Strategy<Value = (String, bool)> {
    (
        prop::sample::select(vec![("true", true), ("false", false), ("1", true), ("0", false)]),
        any::<bool>(),
        "[ \t]{0,3}",
        "[ \t\n]{0,3}",
    )
        .prop_map(|((literal, value), upper, lead, trail)| {
            let literal = if upper {
                literal.to_uppercase()
            } else {
                literal.to_string()
            };
            (format!("{lead}{literal}{trail}"), value)
        })
}

fn extras(counts: &[u32]) -> u64 {
    counts.iter().map(|c| u64::from(c.saturating_sub(1))).sum()
}

// ── Duplicate adjustment ────────────────────────────────────────────────

proptest! {
    #[test]
    fn adjustment_matches_formula(
        base in 0usize..10_000,
        entra in prop::collection::vec(0u32..20, 0..50),
        sophos in prop::collection::vec(0u32..20, 0..50),
    ) {
        let entra_f: Vec<f64> = entra.iter().map(|c| f64::from(*c)).collect();
        let sophos_f: Vec<f64> = sophos.iter().map(|c| f64::from(*c)).collect();
        prop_assert_eq!(
            adjust_count_for_duplicates(base, &entra_f, &sophos_f),
            base as u64 + extras(&entra) + extras(&sophos)
        );
    }

    #[test]
    fn adjustment_never_below_base(
        base in 0usize..10_000,
        entra in prop::collection::vec(-5.0f64..20.0, 0..50),
        sophos in prop::collection::vec(-5.0f64..20.0, 0..50),
    ) {
        prop_assert!(adjust_count_for_duplicates(base, &entra, &sophos) >= base as u64);
    }
}

// ── Presence normalization ──────────────────────────────────────────────

proptest! {
    #[test]
    fn recognized_markers_normalize_to_their_value((marker, value) in arb_recognized_marker()) {
        for policy in [PresencePolicy::Legacy, PresencePolicy::Strict, PresencePolicy::Absent] {
            prop_assert_eq!(normalize_presence(marker.as_str(), policy), Ok(value));
        }
    }

    #[test]
    fn normalization_is_idempotent(
        column in prop::collection::vec(prop::option::of(".{0,8}"), 0..20),
        policy in arb_policy(),
    ) {
        let once = normalize_presence_column(&column, policy).unwrap();
        let twice = normalize_presence_column(&once, policy).unwrap();
        prop_assert_eq!(twice, once);
    }
}

// ── Aggregates ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn overlap_matrix_is_symmetric(records in prop::collection::vec(arb_record(), 0..40)) {
        let matrix = OverlapMatrix::compute(&records);
        for a in Context::ALL {
            for b in Context::ALL {
                prop_assert_eq!(matrix.get(a, b), matrix.get(b, a));
            }
        }
        for cell in &matrix.cells {
            prop_assert_eq!(cell.device_count, matrix.get(cell.context1, cell.context2));
        }
    }

    #[test]
    fn distribution_buckets_match_subset_adjustment(
        records in prop::collection::vec(arb_record(), 0..40),
    ) {
        let distribution = ContextDistribution::compute(&records);
        let mut rows = 0;
        for bucket in &distribution.buckets {
            let subset: Vec<&DeviceRecord> = records
                .iter()
                .filter(|r| r.context_count() == bucket.contexts_present)
                .collect();
            prop_assert!(!subset.is_empty());
            prop_assert_eq!(bucket.rows, subset.len());
            let entra: Vec<f64> = subset.iter().map(|r| r.entra_instances).collect();
            let sophos: Vec<f64> = subset.iter().map(|r| r.sophos_instances).collect();
            prop_assert_eq!(
                bucket.device_count,
                adjust_count_for_duplicates(subset.len(), &entra, &sophos)
            );
            rows += bucket.rows;
        }
        prop_assert_eq!(rows, records.len());
    }
}
