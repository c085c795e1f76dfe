//! Where am I?  Classify the connected set against the known hardware.

use crate::profile::Catalog;
use std::collections::BTreeSet;
use std::fmt;

/// The user's current desk situation, derived from what is plugged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// gdctl reported no monitors at all.
    NoDisplays,
    /// Only the builtin panel is connected.
    LaptopOnly,
    /// Every known external monitor is connected.
    FullHome,
    /// Some external outputs are connected, but not the full set.
    Partial { external: usize },
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::NoDisplays => write!(f, "no displays detected"),
            Environment::LaptopOnly => write!(f, "laptop-only mode (away from home setup)"),
            Environment::FullHome => write!(f, "full home setup (all external monitors connected)"),
            Environment::Partial { external } => {
                write!(f, "partial setup ({} external monitor(s) connected)", external)
            }
        }
    }
}

/// Classify `connected` against the monitors in `catalog`.
///
/// Outputs not in the catalog still count as external monitors for the
/// partial case.
pub fn classify(catalog: &Catalog, connected: &BTreeSet<String>) -> Environment {
    if connected.is_empty() {
        return Environment::NoDisplays;
    }
    let builtin = catalog.builtin().map(|m| m.id.as_str());
    let is_builtin = |id: &str| Some(id) == builtin;

    let external = connected.iter().filter(|id| !is_builtin(id.as_str())).count();
    if external == 0 {
        return Environment::LaptopOnly;
    }

    let mut known_external = catalog.monitors().filter(|m| !m.builtin).peekable();
    if known_external.peek().is_some() && known_external.all(|m| connected.contains(&m.id)) {
        Environment::FullHome
    } else {
        Environment::Partial { external }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn classification() {
        let c = Config::default().catalog().unwrap();
        assert_eq!(classify(&c, &set(&[])), Environment::NoDisplays);
        assert_eq!(classify(&c, &set(&["eDP-1"])), Environment::LaptopOnly);
        assert_eq!(
            classify(&c, &set(&["eDP-1", "DP-2", "DP-3", "DP-4"])),
            Environment::FullHome
        );
        // Lid closed at home: builtin absent still counts as the full setup.
        assert_eq!(classify(&c, &set(&["DP-2", "DP-3", "DP-4"])), Environment::FullHome);
        assert_eq!(
            classify(&c, &set(&["eDP-1", "DP-3"])),
            Environment::Partial { external: 1 }
        );
        assert_eq!(
            classify(&c, &set(&["eDP-1", "HDMI-1"])),
            Environment::Partial { external: 1 }
        );
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(
            Environment::Partial { external: 2 }.to_string(),
            "partial setup (2 external monitor(s) connected)"
        );
    }
}
