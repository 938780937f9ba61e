//! Presence flag normalization.
//!
//! Exports carry presence as `"True"`, `"false"`, `"1"`, `0`, native booleans, or
//! nothing at all. Everything funnels through [`normalize_presence`]: stringify,
//! trim, lowercase, then look up `true`/`false`/`1`/`0`.
//!
//! Values outside that table are decided by [`PresencePolicy`]. The legacy policy
//! treats them as present, including missing cells; only an explicitly empty
//! string reads as absent.

use devscope_core::Merge;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// How to treat presence values outside `true`/`false`/`1`/`0`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum PresencePolicy {
    /// Unrecognized and missing values count as present (historical behavior).
    #[default]
    Legacy,
    /// Unrecognized and missing values are an error.
    Strict,
    /// Unrecognized and missing values count as absent.
    Absent,
}

impl Merge for PresencePolicy {
    fn merge(self, other: Self) -> Self {
        other
    }
}

impl std::str::FromStr for PresencePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(PresencePolicy::Legacy),
            "strict" => Ok(PresencePolicy::Strict),
            "absent" => Ok(PresencePolicy::Absent),
            _ => Err(format!(
                "unknown presence policy `{}` (valid: legacy, strict, absent)",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresenceError {
    #[error("unrecognized presence value {literal:?} (expected true/false/1/0)")]
    Unrecognized { literal: String },
    #[error("missing presence value")]
    Missing,
}

/// Anything that can appear in a presence column.
pub trait PresenceMarker {
    /// Text form of the marker, `None` when the value is missing.
    fn literal(&self) -> Option<Cow<'_, str>>;
}

impl PresenceMarker for bool {
    fn literal(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(if *self { "true" } else { "false" }))
    }
}

impl PresenceMarker for i64 {
    fn literal(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Owned(self.to_string()))
    }
}

impl PresenceMarker for str {
    fn literal(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self))
    }
}

impl PresenceMarker for String {
    fn literal(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.as_str()))
    }
}

impl<T: PresenceMarker> PresenceMarker for Option<T> {
    fn literal(&self) -> Option<Cow<'_, str>> {
        self.as_ref().and_then(|v| v.literal())
    }
}

impl<T: PresenceMarker + ?Sized> PresenceMarker for &T {
    fn literal(&self) -> Option<Cow<'_, str>> {
        (**self).literal()
    }
}

/// Look up a marker in the recognized table. `None` means unrecognized or missing.
pub fn recognize<M: PresenceMarker + ?Sized>(marker: &M) -> Option<bool> {
    let literal = marker.literal()?;
    match literal.trim().to_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Normalize one presence marker to a strict boolean.
pub fn normalize_presence<M: PresenceMarker + ?Sized>(
    marker: &M,
    policy: PresencePolicy,
) -> Result<bool, PresenceError> {
    if let Some(value) = recognize(marker) {
        return Ok(value);
    }

    match policy {
        PresencePolicy::Absent => Ok(false),
        PresencePolicy::Strict => Err(match marker.literal() {
            Some(literal) => PresenceError::Unrecognized {
                literal: literal.into_owned(),
            },
            None => PresenceError::Missing,
        }),
        // A missing value stringifies to a non-empty placeholder; a blank string does not.
        PresencePolicy::Legacy => Ok(marker
            .literal()
            .is_none_or(|literal| !literal.trim().is_empty())),
    }
}

/// Normalize a whole column. Stops at the first error under the strict policy.
pub fn normalize_presence_column<M: PresenceMarker>(
    markers: &[M],
    policy: PresencePolicy,
) -> Result<Vec<bool>, PresenceError> {
    markers
        .iter()
        .map(|m| normalize_presence(m, policy))
        .collect()
}
