//! Installed-memory parsing. KACE reports RAM as "16384 MB", "16384", or "16384.0".

use regex::Regex;
use std::sync::LazyLock;

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)").unwrap());

/// First decimal number in the text, in megabytes.
pub fn parse_megabytes(value: &str) -> Option<f64> {
    let lowered = value.trim().to_lowercase();
    NUMBER
        .captures(&lowered)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Binary convention: 1 GB = 1024 MB.
pub fn megabytes_to_gigabytes(mb: f64) -> f64 {
    mb / 1024.0
}

/// Render a RAM cell as gigabytes with two decimals, or `None` when unparseable.
pub fn format_ram_gigabytes(value: &str) -> Option<String> {
    parse_megabytes(value).map(|mb| format!("{:.2}", megabytes_to_gigabytes(mb)))
}
