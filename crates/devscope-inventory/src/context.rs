//! The five management systems a device can be present in.

use serde::{Deserialize, Serialize};

/// A management system whose device presence is tracked by the export.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Context {
    /// Identity provider.
    Entra,
    /// Mobile device management.
    Intune,
    /// Directory service.
    Ad,
    /// Endpoint protection.
    Sophos,
    /// Asset-management agent.
    Kace,
}

impl Context {
    /// All contexts in export column order.
    pub const ALL: [Context; 5] = [
        Context::Entra,
        Context::Intune,
        Context::Ad,
        Context::Sophos,
        Context::Kace,
    ];

    /// Presence column in the export.
    pub fn presence_column(self) -> &'static str {
        match self {
            Context::Entra => "InEntra",
            Context::Intune => "InIntune",
            Context::Ad => "InAD",
            Context::Sophos => "InSophos",
            Context::Kace => "InKACE",
        }
    }

    /// Display label used for table headers and heatmap axes.
    pub fn label(self) -> &'static str {
        match self {
            Context::Entra => "In Entra",
            Context::Intune => "In Intune",
            Context::Ad => "In AD",
            Context::Sophos => "In Sophos",
            Context::Kace => "In KACE",
        }
    }

    /// Short system name, e.g. for "exclusively in: Sophos".
    pub fn system_name(self) -> &'static str {
        match self {
            Context::Entra => "Entra",
            Context::Intune => "Intune",
            Context::Ad => "AD",
            Context::Sophos => "Sophos",
            Context::Kace => "KACE",
        }
    }

    /// Position in [`Context::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Parse a context from a CLI-style name (`entra`, `ad`, ...), case-insensitive.
    pub fn from_name(name: &str) -> Option<Context> {
        let name = name.trim();
        Context::ALL
            .into_iter()
            .find(|c| c.system_name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
