//! Output formatting utilities.
//!
//! Every dashboard panel implements [`OutputFormatter`] so the CLI can print it
//! as compact text, colored text, JSON, JSON Lines, or a jq projection.

use devscope_core::Merge;
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;

/// Color output mode.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Auto-detect based on TTY (default)
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl Merge for ColorMode {
    fn merge(self, other: Self) -> Self {
        other
    }
}

/// Configuration for pretty output mode.
///
/// Example config.toml:
/// ```toml
/// [pretty]
/// enabled = true       # auto-enable when TTY (default: auto)
/// colors = "auto"      # "auto", "always", or "never"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Default, schemars::JsonSchema)]
#[serde(default)]
pub struct PrettyConfig {
    /// Enable pretty mode. None = auto (true when stdout is TTY)
    pub enabled: Option<bool>,
    /// Color mode: auto (default), always, or never
    pub colors: Option<ColorMode>,
}

impl Merge for PrettyConfig {
    fn merge(self, other: Self) -> Self {
        Self {
            enabled: self.enabled.merge(other.enabled),
            colors: self.colors.merge(other.colors),
        }
    }
}

impl PrettyConfig {
    /// Should pretty mode be enabled?
    /// Respects explicit setting, otherwise auto-detects TTY.
    pub fn enabled(&self) -> bool {
        self.enabled
            .unwrap_or_else(|| std::io::stdout().is_terminal())
    }

    /// Should colors be used?
    /// Respects colors setting and NO_COLOR env var.
    pub fn use_colors(&self) -> bool {
        if std::env::var("NO_COLOR").is_ok() {
            return false;
        }

        match self.colors.unwrap_or_default() {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stdout().is_terminal(),
        }
    }
}

/// Output format and display mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Compact text output (no colors).
    #[default]
    Compact,
    /// Pretty text output (bars and headings, colored if available).
    Pretty { colors: bool },
    /// JSON output.
    Json,
    /// JSON Lines output (one JSON object per line, arrays emit each element).
    JsonLines,
    /// JSON filtered through jq expression. If jsonl is true, emit results as JSON Lines.
    Jq { filter: String, jsonl: bool },
}

impl OutputFormat {
    /// Create from CLI flags and config (fully resolved).
    pub fn from_cli(
        json: bool,
        jsonl: bool,
        jq: Option<&str>,
        pretty: bool,
        compact: bool,
        config: &PrettyConfig,
    ) -> Self {
        // JSON modes take precedence
        if let Some(filter) = jq {
            return OutputFormat::Jq {
                filter: filter.to_string(),
                jsonl,
            };
        }
        if jsonl {
            return OutputFormat::JsonLines;
        }
        if json {
            return OutputFormat::Json;
        }

        let is_pretty = !compact && (pretty || config.enabled());
        if !is_pretty {
            return OutputFormat::Compact;
        }

        let colors = match config.colors.unwrap_or_default() {
            // Explicit --pretty overrides TTY check
            ColorMode::Auto if pretty => std::env::var("NO_COLOR").is_err(),
            _ => config.use_colors(),
        };
        OutputFormat::Pretty { colors }
    }

    /// Is this a JSON-based format?
    pub fn is_json(&self) -> bool {
        matches!(
            self,
            OutputFormat::Json | OutputFormat::JsonLines | OutputFormat::Jq { .. }
        )
    }
}

/// Trait for types that can format output in multiple formats.
///
/// JSON serialization uses serde, while text formatting is custom.
pub trait OutputFormatter: Serialize + schemars::JsonSchema {
    /// Format as minimal text (default).
    fn format_text(&self) -> String;

    /// Format as pretty text. `colors` is false when piping or under NO_COLOR.
    /// Default implementation falls back to format_text().
    fn format_pretty(&self, colors: bool) -> String {
        let _ = colors;
        self.format_text()
    }

    /// Render in the specified format without printing.
    fn render(&self, format: &OutputFormat) -> Result<Vec<String>, String> {
        match format {
            OutputFormat::Compact => Ok(vec![self.format_text()]),
            OutputFormat::Pretty { colors } => Ok(vec![self.format_pretty(*colors)]),
            OutputFormat::Json => serde_json::to_string(self)
                .map(|s| vec![s])
                .map_err(|e| e.to_string()),
            OutputFormat::JsonLines => {
                let json = serde_json::to_value(self).map_err(|e| e.to_string())?;
                Ok(jsonl_lines(&json))
            }
            OutputFormat::Jq { filter, jsonl } => {
                let json = serde_json::to_value(self).map_err(|e| e.to_string())?;
                let results = apply_jq(&json, filter)?;
                if !*jsonl {
                    return Ok(results);
                }
                Ok(results
                    .into_iter()
                    .flat_map(|line| match serde_json::from_str::<serde_json::Value>(&line) {
                        Ok(val) => jsonl_lines(&val),
                        Err(_) => vec![line],
                    })
                    .collect())
            }
        }
    }
}

/// Split a JSON value into JSON Lines.
/// Arrays emit each element as a separate line, other values emit as single line.
fn jsonl_lines(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(arr) => arr
            .iter()
            .map(|item| serde_json::to_string(item).unwrap_or_default())
            .collect(),
        other => vec![serde_json::to_string(other).unwrap_or_default()],
    }
}

/// Apply a jq filter to a JSON value.
pub fn apply_jq(value: &serde_json::Value, filter: &str) -> Result<Vec<String>, String> {
    use jaq_core::load::{Arena, File as JaqFile, Loader};
    use jaq_core::{Compiler, Ctx, RcIter};
    use jaq_json::Val;

    let loader = Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = Arena::default();

    let program = JaqFile {
        code: filter,
        path: (),
    };

    let modules = loader
        .load(&arena, program)
        .map_err(|errs| format!("jq parse error: {:?}", errs))?;

    let compiled = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(|errs| format!("jq compile error: {:?}", errs))?;

    let val = Val::from(value.clone());
    let inputs = RcIter::new(core::iter::empty());
    let out = compiled.run((Ctx::new([], &inputs), val));

    let mut results = Vec::new();
    for result in out {
        match result {
            Ok(v) => results.push(v.to_string()),
            Err(e) => return Err(format!("jq runtime error: {:?}", e)),
        }
    }

    Ok(results)
}

/// Group digits with commas: `12345` -> `12,345`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Render a plain (uncolored) bar using block characters.
///
/// `ratio` is clamped to 0.0–1.0. `width` is the total character count.
pub fn progress_bar(ratio: f64, width: usize) -> String {
    let ratio = ratio.clamp(0.0, 1.0);
    let filled = (ratio * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Render a blue bar, matching the heatmap's color scheme.
pub fn progress_bar_colored(ratio: f64, width: usize) -> String {
    nu_ansi_term::Color::Blue
        .paint(progress_bar(ratio, width))
        .to_string()
}

/// Shade a heatmap cell: higher ratios get a stronger blue.
pub fn heat_cell(text: &str, ratio: f64) -> String {
    use nu_ansi_term::Color;
    let color = if ratio >= 0.67 {
        Color::Blue
    } else if ratio >= 0.34 {
        Color::LightBlue
    } else {
        Color::Cyan
    };
    color.paint(text).to_string()
}

/// Section heading, bold when colors are enabled.
pub fn heading(title: &str, colors: bool) -> String {
    let text = format!("━━━ {} ━━━", title);
    if colors {
        nu_ansi_term::Style::new().bold().paint(text).to_string()
    } else {
        text
    }
}

/// Lay out rows as left-aligned columns separated by two spaces.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<w$}", cell, w = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(line(headers));
    for row in rows {
        lines.push(line(row));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, schemars::JsonSchema)]
    struct Metric {
        name: String,
        count: u64,
    }

    impl OutputFormatter for Metric {
        fn format_text(&self) -> String {
            format!("{}: {}", self.name, format_count(self.count))
        }
    }

    #[test]
    fn test_output_format_from_cli() {
        let config = PrettyConfig::default();
        assert_eq!(
            OutputFormat::from_cli(false, false, None, false, true, &config),
            OutputFormat::Compact
        );
        assert_eq!(
            OutputFormat::from_cli(true, false, None, false, false, &config),
            OutputFormat::Json
        );
        // jsonl takes precedence over json (when no jq)
        assert_eq!(
            OutputFormat::from_cli(true, true, None, false, false, &config),
            OutputFormat::JsonLines
        );
        assert_eq!(
            OutputFormat::from_cli(true, true, Some(".count"), false, false, &config),
            OutputFormat::Jq {
                filter: ".count".to_string(),
                jsonl: true
            }
        );
    }

    #[test]
    fn test_render_formats() {
        let metric = Metric {
            name: "Total devices".to_string(),
            count: 1234,
        };
        assert_eq!(
            metric.render(&OutputFormat::Compact).unwrap(),
            vec!["Total devices: 1,234"]
        );
        assert_eq!(
            metric.render(&OutputFormat::Json).unwrap(),
            vec![r#"{"name":"Total devices","count":1234}"#]
        );
        let jq = OutputFormat::Jq {
            filter: ".count".to_string(),
            jsonl: false,
        };
        assert_eq!(metric.render(&jq).unwrap(), vec!["1234"]);
    }

    #[test]
    fn test_apply_jq_error() {
        let value = serde_json::json!({"count": 1});
        assert!(apply_jq(&value, ".[").is_err());
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.5, 4), "██░░");
        assert_eq!(progress_bar(2.0, 2), "██");
        assert_eq!(progress_bar(-1.0, 2), "░░");
    }

    #[test]
    fn test_render_table_aligns() {
        let headers = vec!["Device Name".to_string(), "OS".to_string()];
        let rows = vec![
            vec!["PC-1".to_string(), "Windows".to_string()],
            vec!["LAPTOP-22".to_string(), "macOS".to_string()],
        ];
        let table = render_table(&headers, &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "Device Name  OS");
        assert_eq!(lines[1], "PC-1         Windows");
        assert_eq!(lines[2], "LAPTOP-22    macOS");
    }

    #[test]
    fn test_pretty_config_use_colors() {
        let config = PrettyConfig {
            colors: Some(ColorMode::Never),
            ..Default::default()
        };
        assert!(!config.use_colors());
    }

    #[test]
    fn test_pretty_config_merge() {
        let global = PrettyConfig {
            enabled: Some(true),
            colors: Some(ColorMode::Always),
        };
        let project = PrettyConfig {
            enabled: None,
            colors: Some(ColorMode::Never),
        };
        let merged = global.merge(project);
        assert_eq!(merged.enabled, Some(true));
        assert_eq!(merged.colors, Some(ColorMode::Never));
    }
}
