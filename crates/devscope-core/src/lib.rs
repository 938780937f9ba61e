//! Shared primitives for devscope crates.
//!
//! Currently just the [`Merge`] trait used to layer the global config
//! under the per-project one.

use std::path::PathBuf;

/// Trait for merging configuration values.
///
/// Convention: `other` takes precedence over `self`.
/// For Option types, `other` wins if Some, otherwise falls back to `self`.
pub trait Merge {
    fn merge(self, other: Self) -> Self;
}

macro_rules! replace_on_merge {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Merge for $ty {
                fn merge(self, other: Self) -> Self {
                    other
                }
            }
        )*
    };
}

replace_on_merge!(bool, u64, String, PathBuf);

impl<T: Merge> Merge for Option<T> {
    fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Some(a), Some(b)) => Some(a.merge(b)),
            (None, b) => b,
            (a, None) => a,
        }
    }
}

impl<T> Merge for Vec<T> {
    /// Vectors: other replaces self entirely (not appended)
    fn merge(self, other: Self) -> Self {
        other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_merge() {
        assert_eq!(None::<u64>.merge(Some(60)), Some(60));
        assert_eq!(Some(60u64).merge(None), Some(60));
        assert_eq!(Some(60u64).merge(Some(120)), Some(120));
    }

    #[test]
    fn test_vec_replaces() {
        let global = vec!["powershell".to_string(), "-File".to_string()];
        let project = vec!["pwsh".to_string()];
        assert_eq!(global.merge(project), vec!["pwsh".to_string()]);
    }
}
