//! Human-readable reports for the terminal.
//!
//! Every function returns a `String` so the binary decides where it goes
//! and tests can inspect the text.

use crate::environment::Environment;
use crate::gdctl::parse::MonitorModes;
use crate::profile::{Catalog, Target};
use crate::switcher::{Applied, SwitchError};
use std::collections::BTreeSet;

/// Append one formatted line to a `String` buffer.
macro_rules! put {
    ($buf:expr) => {
        $buf.push('\n')
    };
    ($buf:expr, $($arg:tt)*) => {{
        $buf.push_str(&format!($($arg)*));
        $buf.push('\n');
    }};
}

const RULE: &str = "==================================================";

/// Shell-alias spelling of a target name (`DP-2` → `dp2`).
pub fn alias(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Usage text, followed by a note about the current environment when the
/// connected set could be queried.
pub fn usage(catalog: &Catalog, current: Option<(&BTreeSet<String>, Environment)>) -> String {
    let mut out = String::new();
    put!(out, "gdswitch - instant GNOME monitor switching (gdctl)");
    put!(out, "Usage: gdswitch <command>");
    put!(out);
    put!(out, "Targets:");
    for target in catalog.targets() {
        put!(out, "  {:<12} {}", target.name(), target.summary());
    }
    put!(out);
    put!(out, "Commands:");
    put!(out, "  {:<12} Show current configuration", "show");
    put!(out, "  {:<12} List all known monitors and layouts", "list");
    put!(out, "  {:<12} Show only connected monitors", "available");
    put!(out, "  {:<12} List the modes each connected monitor supports", "modes [ID]");
    put!(out, "  {:<12} Drive one monitor at an explicit mode", "set ID MODE");

    if let Some((connected, env)) = current {
        put!(out);
        put!(out, "Current: {}", env);
        match env {
            Environment::NoDisplays => {}
            Environment::LaptopOnly => {
                if let Some(builtin) = catalog.builtin() {
                    put!(out, "Only '{}' will work in this setup", builtin.id);
                }
            }
            Environment::FullHome => {
                put!(out, "All targets available");
            }
            Environment::Partial { .. } => {
                put!(out, "Working monitors: {}", join(connected));
            }
        }
    }
    out
}

/// Every monitor and layout in the table.
pub fn list(catalog: &Catalog) -> String {
    let mut out = String::new();
    put!(out, "Known monitors:");
    put!(out, "{}", RULE);
    for m in catalog.monitors() {
        put!(out, "{}: {}", m.id, m.name);
        if !m.description.is_empty() {
            put!(out, "   {}", m.description);
        }
        put!(out, "   Vendor: {}, Product: {}", m.vendor, m.product);
        put!(out, "   Maximum mode: {}", m.max_mode);
        put!(out);
    }
    for target in catalog.targets() {
        match target {
            Target::Single(_) => {}
            Target::Layout(l) => {
                put!(out, "{}: {}", l.name, target.summary());
                for member in &l.members {
                    out.push_str(&format!("   {} at ({}, {})", member.monitor, member.x, member.y));
                    if let Some(t) = member.transform {
                        out.push_str(&format!(", transform {}", t));
                    }
                    if member.primary {
                        out.push_str(", primary");
                    }
                    put!(out);
                }
                put!(out);
            }
            Target::Dual(d) => {
                put!(out, "{}: {}", d.name, target.summary());
                let companions: Vec<&str> = d.companions.iter().map(|c| c.monitor.as_str()).collect();
                put!(out, "   companions (in order): {}", companions.join(", "));
                put!(out);
            }
        }
    }
    out
}

/// Connected monitors, the environment, and the targets that would work.
pub fn available(
    catalog: &Catalog,
    connected: &BTreeSet<String>,
    env: Environment,
    satisfied: &[Target<'_>],
) -> String {
    let mut out = String::new();
    if connected.is_empty() {
        put!(out, "No monitors detected!");
        return out;
    }
    put!(out, "Currently connected monitors:");
    put!(out, "{}", RULE);
    for id in connected {
        match catalog.monitor(id) {
            Some(m) => {
                put!(out, "[ok] {}: {}", id, m.name);
                if !m.description.is_empty() {
                    put!(out, "     {}", m.description);
                }
            }
            None => {
                put!(out, "[??] {}: unknown monitor (not in configuration)", id);
            }
        }
    }
    put!(out);
    put!(out, "Environment: {}", env);
    put!(out);
    put!(out, "Available targets:");
    for target in satisfied {
        put!(
            out,
            "  {:<12} ({}) {}",
            target.name(),
            alias(target.name()),
            target.summary()
        );
    }
    out
}

/// Mode listing, grouped by resolution, with current and maximum marked.
pub fn modes(monitors: &[MonitorModes]) -> String {
    let mut out = String::new();
    if monitors.is_empty() {
        put!(out, "No monitors detected!");
        return out;
    }
    for m in monitors {
        put!(out, "{} ({})", m.name, m.id);
        put!(out, "{}", RULE);
        let groups = m.by_resolution();
        for (i, (resolution, group)) in groups.iter().enumerate() {
            let native = if i == 0 { " (native)" } else { "" };
            put!(out, "{}{}:", resolution, native);
            for (j, mode) in group.iter().enumerate() {
                let mut marks = Vec::new();
                if m.current.as_ref() == Some(*mode) {
                    marks.push("current");
                }
                if j == 0 {
                    marks.push("maximum");
                }
                let marks = if marks.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", marks.join(", "))
                };
                put!(out, "  {} Hz{}", mode.refresh(), marks);
            }
        }
        put!(out);
    }
    out
}

/// Confirmation after a successful switch.
pub fn applied(applied: &Applied) -> String {
    let mut out = String::new();
    if let Some(ref path) = applied.backup {
        put!(out, "Configuration backed up to: {}", path.display());
    }
    if !applied.output.trim().is_empty() {
        put!(out, "{}", applied.output.trim_end());
    }
    put!(out, "Switched to {}", applied.target);
    out
}

/// Explain a failed request, naming the hardware involved.
///
/// `env` is the environment at the time of failure, when known.
pub fn failure(err: &SwitchError, env: Option<Environment>) -> String {
    let mut out = String::new();
    put!(out, "error: {}", err);
    match err {
        SwitchError::UnknownTarget { .. } => {
            put!(out, "Run without arguments to see available commands");
            put!(out, "Use 'available' to see only connected monitors");
        }
        SwitchError::NotConnected {
            missing,
            alternatives,
            ..
        } => {
            put!(out, "Missing monitors: {}", join(missing));
            if let Some(env) = env {
                put!(out, "You appear to be in {}", env);
            }
            if alternatives.is_empty() {
                put!(out, "No target is usable with the current hardware");
            } else {
                put!(out, "Try instead: {}", alternatives.join(", "));
            }
        }
        SwitchError::ExternalToolFailure { .. } => {
            put!(out, "Try running 'gdctl show' to verify your system setup");
        }
        SwitchError::NotAMonitor { .. } => {
            put!(out, "Use 'gdswitch list' to see monitor names");
        }
        SwitchError::UnsupportedMode { monitor, .. } => {
            put!(out, "Run 'gdswitch modes {}' to see supported modes", monitor);
        }
    }
    out
}

fn join(ids: &BTreeSet<String>) -> String {
    ids.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::gdctl::parse;

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn alias_matches_shell_spelling() {
        assert_eq!(alias("DP-2"), "dp2");
        assert_eq!(alias("eDP-1"), "edp1");
        assert_eq!(alias("triple"), "triple");
    }

    #[test]
    fn usage_mentions_laptop_only_hint() {
        let c = Config::default().catalog().unwrap();
        let text = usage(&c, Some((&set(&["eDP-1"]), Environment::LaptopOnly)));
        assert!(text.contains("triple"));
        assert!(text.contains("Only 'eDP-1' will work"));
    }

    #[test]
    fn available_lists_satisfied_targets_and_unknowns() {
        let c = Config::default().catalog().unwrap();
        let connected = set(&["eDP-1", "DP-3", "HDMI-1"]);
        let satisfied: Vec<_> = c
            .targets()
            .into_iter()
            .filter(|t| t.missing(&connected).is_empty())
            .collect();
        let text = available(&c, &connected, Environment::Partial { external: 2 }, &satisfied);
        assert!(text.contains("[ok] DP-3: LG 29\" UltraWide"));
        assert!(text.contains("[??] HDMI-1"));
        assert!(text.contains("(dp3)"));
        assert!(text.contains("dual"));
        assert!(!text.contains("triple"));
    }

    #[test]
    fn not_connected_names_missing_hardware() {
        let err = SwitchError::NotConnected {
            target: "triple".into(),
            missing: set(&["DP-2", "DP-4"]),
            alternatives: vec!["DP-3".into(), "eDP-1".into()],
            connected: set(&["DP-3", "eDP-1"]),
        };
        let text = failure(&err, Some(Environment::Partial { external: 1 }));
        assert!(text.contains("triple needs DP-2, DP-4 which are not connected"));
        assert!(text.contains("Missing monitors: DP-2, DP-4"));
        assert!(text.contains("Try instead: DP-3, eDP-1"));
    }

    #[test]
    fn tool_failure_is_shown_verbatim() {
        let err = SwitchError::ExternalToolFailure {
            stderr: "Invalid mode 1x1@1\n".into(),
        };
        let text = failure(&err, None);
        assert!(text.starts_with("error: display tool failed: Invalid mode 1x1@1\n"));
    }

    #[test]
    fn layout_given_to_set_points_at_list() {
        let err = SwitchError::NotAMonitor {
            target: "triple".into(),
        };
        let text = failure(&err, None);
        assert_eq!(
            text,
            "error: triple is a layout, not a single monitor\nUse 'gdswitch list' to see monitor names\n"
        );
    }

    #[test]
    fn modes_marks_current_and_maximum() {
        let report = "\
Monitors:
└──Monitor DP-4 (Iiyama)
   ├──Current mode
   │   └──3440x1440@59.973
   └──Modes (3)
       ├──3440x1440@59.973
       ├──3440x1440@179.981
       └──1920x1080@60.000
";
        let text = modes(&parse::monitors(report));
        assert!(text.contains("3440x1440 (native):"));
        assert!(text.contains("179.981 Hz (maximum)"));
        assert!(text.contains("59.973 Hz (current)"));
        assert!(text.contains("60.000 Hz (maximum)"));
    }
}
