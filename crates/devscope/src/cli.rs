//! Command-line interface definition.

use clap::{Args, Parser, Subcommand};
use devscope_inventory::{ContextSelection, DuplicateFilter, PresencePolicy};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "devscope",
    version,
    about = "Device inventory dashboard over merged Entra, Intune, AD, Sophos, and KACE exports"
)]
pub struct Cli {
    /// Project root; config and the export directory resolve against it
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Read this export instead of the newest match in the export directory
    #[arg(long, global = true, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// How to treat presence values other than true/false/1/0 (legacy, strict, absent)
    #[arg(long, global = true, value_name = "POLICY")]
    pub presence: Option<PresencePolicy>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Output as JSON Lines
    #[arg(long, global = true)]
    pub jsonl: bool,

    /// Filter JSON output with a jq expression
    #[arg(long, global = true, value_name = "EXPR")]
    pub jq: Option<String>,

    /// Headings, bars, and colors
    #[arg(long, global = true, conflicts_with = "compact")]
    pub pretty: bool,

    /// Plain text, even on a terminal
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Headline metrics and the export in use
    Summary,

    /// Pairwise overlap between contexts, duplicates included
    Overlap,

    /// Devices grouped by how many contexts they appear in
    Distribution,

    /// Summary, overlap, and distribution together
    Dashboard {
        /// Re-render every SECS seconds, reloading when the export changes
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,

        /// Stop watching after N renders
        #[arg(long, value_name = "N", requires = "watch")]
        iterations: Option<u64>,
    },

    /// Filtered device table
    List(ListArgs),

    /// Device types and operating systems available to `list` filters
    Options,

    /// Property sheet for one device; lists device names when NAME is omitted
    Show {
        /// Device name, matched exactly
        name: Option<String>,
    },

    /// Run the export script and wait for a new export
    Refresh,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// all, all-systems, or one of entra, intune, ad, sophos, kace
    #[arg(long, default_value = "all")]
    pub context: ContextSelection,

    /// With a single context, only devices in no other context
    #[arg(long)]
    pub exclusive: bool,

    /// Keep these device types (repeatable)
    #[arg(long = "device-type", value_name = "TYPE")]
    pub device_types: Vec<String>,

    /// Keep these operating systems (repeatable)
    #[arg(long = "os", value_name = "OS")]
    pub operating_systems: Vec<String>,

    /// all, only, or none
    #[arg(long, default_value = "all")]
    pub duplicates: DuplicateFilter,

    /// Show only these columns, by display label (repeatable)
    #[arg(long = "field", value_name = "LABEL")]
    pub fields: Vec<String>,
}
