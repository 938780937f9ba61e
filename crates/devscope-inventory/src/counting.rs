//! Duplicate-aware device counting.
//!
//! A physical device can show up several times inside Entra or Sophos. Adjusted
//! counts add every instance beyond the first, so they measure visible device
//! instances rather than unique devices.

/// Extra instances contributed by one source: `Σ max(c - 1, 0)`.
///
/// Non-numeric values are expected to have been coerced to 0 already; NaN also
/// contributes nothing.
pub fn duplicate_extras(instance_counts: &[f64]) -> f64 {
    instance_counts.iter().map(|c| (c - 1.0).max(0.0)).sum()
}

/// `base_count` plus the duplicate extras of both sources, truncated to an integer.
///
/// The instance-count slices must describe the same rows `base_count` counts.
pub fn adjust_count_for_duplicates(
    base_count: usize,
    entra_instance_counts: &[f64],
    sophos_instance_counts: &[f64],
) -> u64 {
    let total = base_count as f64
        + duplicate_extras(entra_instance_counts)
        + duplicate_extras(sophos_instance_counts);
    total as u64
}
