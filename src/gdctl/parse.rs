//! Parsers for the tree-shaped text printed by `gdctl show`.
//!
//! A typical report looks like this (abridged):
//!
//! ```text
//! Monitors:
//! ├──Monitor DP-2 (ASUSTek COMPUTER INC 34")
//! │  ├──Vendor: AUS
//! │  ├──Product: VG34VQEL1A
//! │  ├──Current mode
//! │  │   └──3440x1440@100.006
//! │  └──Modes (2)
//! │      ├──3440x1440@100.006
//! │      └──3440x1440@59.973
//! └──Monitor eDP-1 (Built-in display)
//!    ...
//! Logical monitors:
//! └──Logical monitor #1
//!    ...
//! ```
//!
//! Only the `Monitors:` section is interpreted; everything else is ignored.

use crate::profile::Mode;
use std::collections::{BTreeMap, BTreeSet};

/// One monitor as described by `gdctl show --modes`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorModes {
    pub id: String,
    /// The text in parentheses after the connector name.
    pub name: String,
    pub vendor: String,
    pub product: String,
    pub current: Option<Mode>,
    pub preferred: Option<Mode>,
    /// Every supported mode, in the order gdctl lists them.
    pub modes: Vec<Mode>,
}

impl MonitorModes {
    /// Modes grouped by resolution, largest resolution first; refresh
    /// rates within a group are sorted highest first.
    pub fn by_resolution(&self) -> Vec<(String, Vec<&Mode>)> {
        let mut groups: BTreeMap<(u64, String), Vec<&Mode>> = BTreeMap::new();
        for mode in &self.modes {
            groups
                .entry((mode.pixels(), mode.resolution()))
                .or_default()
                .push(mode);
        }
        groups
            .into_iter()
            .rev()
            .map(|((_, resolution), mut modes)| {
                modes.sort_by(|a, b| b.refresh_hz().total_cmp(&a.refresh_hz()));
                (resolution, modes)
            })
            .collect()
    }

    /// Whether gdctl lists `mode` for this monitor.
    pub fn supports(&self, mode: &Mode) -> bool {
        self.modes.contains(mode)
    }
}

/// Which sub-list of a monitor block the next mode line belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Other,
    Current,
    Preferred,
    Modes,
}

/// Strip the box-drawing prefix from a tree line.
fn strip_tree(line: &str) -> &str {
    line.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '│' | '├' | '└' | '─'))
        .trim_end()
}

/// Parse `Monitor <ID> (<name>)` into its two parts.
fn monitor_header(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix("Monitor ")?;
    let (id, tail) = match rest.split_once(char::is_whitespace) {
        Some((id, tail)) => (id, tail.trim()),
        None => (rest, ""),
    };
    if id.is_empty() {
        return None;
    }
    let name = tail
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(tail);
    Some((id, name))
}

/// Parse every monitor block of a `gdctl show [--modes]` report.
pub fn monitors(report: &str) -> Vec<MonitorModes> {
    let mut out: Vec<MonitorModes> = Vec::new();
    let mut section = Section::Other;
    // Reports without a `Monitors:` header are treated as one.
    let mut in_monitors = true;

    for line in report.lines() {
        // Top-level section headers start in column zero.
        let indented =
            line.starts_with(|c: char| c.is_whitespace() || matches!(c, '│' | '├' | '└'));
        if !line.is_empty() && !indented {
            in_monitors = line.trim_end() == "Monitors:";
            continue;
        }
        if !in_monitors {
            continue;
        }

        let text = strip_tree(line);
        if let Some((id, name)) = monitor_header(text) {
            out.push(MonitorModes {
                id: id.to_string(),
                name: name.to_string(),
                ..Default::default()
            });
            section = Section::Other;
            continue;
        }
        let Some(current) = out.last_mut() else {
            continue;
        };

        if let Some(vendor) = text.strip_prefix("Vendor:") {
            current.vendor = vendor.trim().to_string();
        } else if let Some(product) = text.strip_prefix("Product:") {
            current.product = product.trim().to_string();
        } else if text.starts_with("Current mode") {
            section = Section::Current;
        } else if text.starts_with("Preferred mode") {
            section = Section::Preferred;
        } else if text.starts_with("Modes") {
            section = Section::Modes;
        } else if let Some(mode) = text
            .split_whitespace()
            .next()
            .and_then(|t| t.parse::<Mode>().ok())
        {
            match section {
                Section::Current => current.current = Some(mode),
                Section::Preferred => current.preferred = Some(mode),
                Section::Modes => current.modes.push(mode),
                Section::Other => {}
            }
        } else {
            section = Section::Other;
        }
    }
    out
}

/// Connector names of every monitor in a `gdctl show` report.
///
/// An empty report yields an empty set.
pub fn connected(report: &str) -> BTreeSet<String> {
    monitors(report).into_iter().map(|m| m.id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `gdctl show` on the full home setup, abridged to the shape we parse.
    const HOME_REPORT: &str = "\
Monitors:
├──Monitor DP-2 (ASUSTek COMPUTER INC 34\")
│  ├──Vendor: AUS
│  ├──Product: VG34VQEL1A
│  ├──Serial: M3LMQS000001
│  ├──Current mode
│  │   └──3440x1440@100.006
│  └──Preferred mode
│      └──3440x1440@59.973
├──Monitor DP-3 (LG Electronics 29\")
│  ├──Vendor: GSM
│  ├──Product: LG ULTRAWIDE
│  └──Current mode
│      └──2560x1080@60.000
├──Monitor DP-4 (Iiyama North America 34\")
│  ├──Vendor: IVM
│  ├──Product: PL3481WQ
│  └──Current mode
│      └──3440x1440@179.981
└──Monitor eDP-1 (Built-in display)
   ├──Vendor: CSO
   ├──Product: 0x1319
   └──Current mode
       └──2880x1920@60.000

Logical monitors:
├──Logical monitor #1
│  ├──Position: (0, 0)
│  ├──Scale: 1.0
│  ├──Transform: 270
│  └──Monitors: (1)
│      └──DP-3 (LG Electronics 29\")
└──Logical monitor #2
   ├──Position: (1080, 0)
   ├──Primary: yes
   └──Monitors: (1)
       └──DP-4 (Iiyama North America 34\")
";

    const MODES_REPORT: &str = "\
Monitors:
└──Monitor DP-4 (Iiyama North America 34\")
   ├──Vendor: IVM
   ├──Product: PL3481WQ
   ├──Current mode
   │   └──3440x1440@59.973
   ├──Preferred mode
   │   └──3440x1440@59.973
   └──Modes (5)
       ├──3440x1440@59.973
       ├──3440x1440@179.981
       ├──3440x1440@99.982
       ├──2560x1440@59.951
       └──1920x1080@60.000
";

    #[test]
    fn connected_ids_from_home_report() {
        let ids: Vec<String> = connected(HOME_REPORT).into_iter().collect();
        assert_eq!(ids, ["DP-2", "DP-3", "DP-4", "eDP-1"]);
    }

    #[test]
    fn logical_monitor_section_is_ignored() {
        let report = "\
Monitors:
└──Monitor eDP-1 (Built-in display)
   └──Current mode
       └──2880x1920@60.000

Logical monitors:
└──Logical monitor #1
   └──Monitors: (1)
       └──eDP-1 (Built-in display)
";
        let ids: Vec<String> = connected(report).into_iter().collect();
        assert_eq!(ids, ["eDP-1"]);
    }

    #[test]
    fn empty_report_means_no_displays() {
        assert!(connected("").is_empty());
        assert!(connected("Monitors:\n").is_empty());
    }

    #[test]
    fn vendor_product_and_current_mode() {
        let ms = monitors(HOME_REPORT);
        assert_eq!(ms.len(), 4);
        let asus = &ms[0];
        assert_eq!(asus.name, "ASUSTek COMPUTER INC 34\"");
        assert_eq!(asus.vendor, "AUS");
        assert_eq!(asus.product, "VG34VQEL1A");
        assert_eq!(asus.current.as_ref().unwrap().to_string(), "3440x1440@100.006");
        assert_eq!(asus.preferred.as_ref().unwrap().to_string(), "3440x1440@59.973");
        assert!(asus.modes.is_empty());
    }

    #[test]
    fn modes_are_collected_and_grouped() {
        let ms = monitors(MODES_REPORT);
        assert_eq!(ms.len(), 1);
        let m = &ms[0];
        assert_eq!(m.modes.len(), 5);
        assert!(m.supports(&"3440x1440@179.981".parse().unwrap()));
        assert!(!m.supports(&"3440x1440@180.000".parse().unwrap()));

        let groups = m.by_resolution();
        let names: Vec<&str> = groups.iter().map(|(r, _)| r.as_str()).collect();
        assert_eq!(names, ["3440x1440", "2560x1440", "1920x1080"]);
        let refresh: Vec<&str> = groups[0].1.iter().map(|m| m.refresh()).collect();
        assert_eq!(refresh, ["179.981", "99.982", "59.973"]);
    }
}
