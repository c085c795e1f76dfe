//! Application configuration.
//!
//! The configuration is loaded from `$XDG_CONFIG_HOME/gdswitch/config.json`.
//! Every section is optional: a minimal `{}` file (or no file at all) yields
//! the compiled-in monitor table.  Replacing `monitors` / `layouts` lets the
//! table follow a hardware change without recompiling.
//!
//! # Example
//!
//! ```json
//! {
//!   "tool": { "program": "gdctl", "timeout_ms": 5000, "verbose": true },
//!   "backup": { "dir": "/home/me/bin/monitors/configs" },
//!   "monitors": [
//!     { "id": "DP-2", "name": "ASUS 34\" UltraWide", "max_mode": "3440x1440@100.006" },
//!     { "id": "eDP-1", "name": "Laptop", "max_mode": "2880x1920@60.000", "builtin": true }
//!   ],
//!   "layouts": [],
//!   "dual": null
//! }
//! ```

use crate::profile::{
    Catalog, CatalogError, Companion, DualSpec, LayoutMember, LayoutSpec, Mode, MonitorProfile,
    Transform,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// How to invoke the display tool.
    #[serde(default)]
    pub tool: ToolConfig,

    /// Where backup records go.
    #[serde(default)]
    pub backup: BackupConfig,

    #[serde(default = "default_monitors")]
    pub monitors: Vec<MonitorProfile>,

    #[serde(default = "default_layouts")]
    pub layouts: Vec<LayoutSpec>,

    /// The portable laptop + external arrangement.  `null` disables it.
    #[serde(default = "default_dual")]
    pub dual: Option<DualSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tool: ToolConfig::default(),
            backup: BackupConfig::default(),
            monitors: default_monitors(),
            layouts: default_layouts(),
            dual: default_dual(),
        }
    }
}

/// Display tool invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Program name or path.
    pub program: String,
    /// Per-invocation timeout (ms).  The child is killed when it expires.
    pub timeout_ms: u64,
    /// Pass `--verbose` to mutating calls.
    pub verbose: bool,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: "gdctl".into(),
            timeout_ms: 5000,
            verbose: true,
        }
    }
}

/// Backup record settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Defaults to `~/bin/monitors/configs`.
    pub dir: Option<PathBuf>,
}

impl BackupConfig {
    /// The directory to write backups to.
    pub fn resolved_dir(&self) -> PathBuf {
        match self.dir {
            Some(ref dir) => dir.clone(),
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("bin")
                .join("monitors")
                .join("configs"),
        }
    }
}

fn profile(
    id: &str,
    name: &str,
    vendor: &str,
    product: &str,
    description: &str,
    max_mode: Mode,
) -> MonitorProfile {
    MonitorProfile {
        id: id.into(),
        name: name.into(),
        vendor: vendor.into(),
        product: product.into(),
        description: description.into(),
        max_mode,
        builtin: false,
    }
}

fn default_monitors() -> Vec<MonitorProfile> {
    let mut laptop = profile(
        "eDP-1",
        "Built-in Laptop Display",
        "CSO",
        "0x1319",
        "Built-in laptop screen with 2880x1920 resolution",
        Mode::new(2880, 1920, "60.000"),
    );
    laptop.builtin = true;
    vec![
        profile(
            "DP-2",
            "ASUS 34\" UltraWide",
            "AUS",
            "VG34VQEL1A",
            "ASUS monitor with 3440x1440 resolution",
            Mode::new(3440, 1440, "100.006"),
        ),
        profile(
            "DP-3",
            "LG 29\" UltraWide",
            "GSM",
            "LG ULTRAWIDE",
            "LG monitor with 2560x1080 resolution",
            Mode::new(2560, 1080, "60.000"),
        ),
        profile(
            "DP-4",
            "Iiyama 34\" UltraWide",
            "IVM",
            "PL3481WQ",
            "Iiyama monitor with 3440x1440 resolution",
            Mode::new(3440, 1440, "179.981"),
        ),
        laptop,
    ]
}

fn member(monitor: &str, x: i32, y: i32) -> LayoutMember {
    LayoutMember {
        monitor: monitor.into(),
        mode: None,
        x,
        y,
        transform: None,
        scale: None,
        primary: false,
    }
}

/// LG portrait on the left, Iiyama top-right, ASUS (primary) bottom-right.
fn default_layouts() -> Vec<LayoutSpec> {
    vec![LayoutSpec {
        name: "triple".into(),
        description: "LG portrait (left) | Iiyama (top-right) | ASUS primary (bottom-right)".into(),
        members: vec![
            LayoutMember {
                transform: Some(Transform::Rotate270),
                ..member("DP-3", 0, 0)
            },
            member("DP-4", 1080, 0),
            LayoutMember {
                primary: true,
                ..member("DP-2", 1080, 1440)
            },
        ],
    }]
}

fn default_dual() -> Option<DualSpec> {
    let companion = |monitor: &str, mode: Mode| Companion {
        monitor: monitor.into(),
        mode,
    };
    Some(DualSpec {
        name: "dual".into(),
        anchor: LayoutMember {
            mode: Some(Mode::new(2880, 1920, "60.000")),
            scale: Some(1.75),
            ..member("eDP-1", 0, 0)
        },
        // Portable monitors usually land on DP-3.
        companions: vec![
            companion("DP-3", Mode::new(1920, 1080, "60.000")),
            companion("DP-4", Mode::new(3440, 1440, "59.973")),
            companion("DP-2", Mode::new(3440, 1440, "59.973")),
        ],
        // Logical width of the 2880px panel at 175% scale.
        companion_x: 1644,
        companion_y: 0,
    })
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.catalog()?;
        Ok(config)
    }

    /// Default location: `<config dir>/gdswitch/config.json`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gdswitch")
            .join("config.json")
    }

    /// Build the immutable monitor table.
    pub fn catalog(&self) -> Result<Catalog, CatalogError> {
        Catalog::new(self.monitors.clone(), self.layouts.clone(), self.dual.clone())
    }
}

/// Error from loading or validating a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid monitor table: {0}")]
    Catalog(#[from] CatalogError),
}

impl ConfigError {
    /// `true` when the file simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    fn tmp_file(contents: &str) -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "gdswitch-config-test-{}-{}.json",
            std::process::id(),
            id
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.tool.program, "gdctl");
        assert_eq!(cfg.tool.timeout_ms, 5000);
        assert!(cfg.tool.verbose);
        assert!(cfg.backup.dir.is_none());
        let ids: Vec<&str> = cfg.monitors.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["DP-2", "DP-3", "DP-4", "eDP-1"]);
        assert_eq!(cfg.layouts.len(), 1);
        assert_eq!(cfg.dual.as_ref().unwrap().name, "dual");
        cfg.catalog().unwrap();
    }

    #[test]
    fn deserialize_partial_tool() {
        let cfg: Config = serde_json::from_str(r#"{ "tool": { "timeout_ms": 250 } }"#).unwrap();
        assert_eq!(cfg.tool.timeout_ms, 250);
        assert_eq!(cfg.tool.program, ToolConfig::default().program);
    }

    #[test]
    fn null_dual_disables_it() {
        let cfg: Config = serde_json::from_str(r#"{ "dual": null }"#).unwrap();
        assert!(cfg.dual.is_none());
        assert!(cfg.catalog().unwrap().resolve("dual").is_none());
    }

    #[test]
    fn custom_monitor_table() {
        let json = r#"{
            "monitors": [
                { "id": "HDMI-1", "name": "TV", "max_mode": "3840x2160@60.000" },
                { "id": "eDP-1", "name": "Laptop", "max_mode": "1920x1200@60.000", "builtin": true }
            ],
            "layouts": [
                { "name": "couch", "members": [
                    { "monitor": "HDMI-1", "primary": true },
                    { "monitor": "eDP-1", "x": 3840, "transform": "90" }
                ] }
            ],
            "dual": null
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        let catalog = cfg.catalog().unwrap();
        assert_eq!(catalog.builtin().unwrap().id, "eDP-1");
        let couch = catalog.layouts().next().unwrap();
        assert_eq!(couch.members[1].transform, Some(Transform::Rotate90));
        assert_eq!(couch.members[1].x, 3840);
    }

    #[test]
    fn malformed_mode_is_a_parse_error() {
        let path = tmp_file(r#"{ "monitors": [ { "id": "DP-1", "name": "x", "max_mode": "fast" } ] }"#);
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn inconsistent_table_is_rejected_on_load() {
        let path = tmp_file(r#"{ "layouts": [ { "name": "solo", "members": [ { "monitor": "DP-9", "primary": true } ] } ] }"#);
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Catalog(CatalogError::UnknownMember { .. })));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn dual_with_empty_companions_is_rejected_on_load() {
        let path = tmp_file(
            r#"{ "dual": { "name": "dual", "anchor": { "monitor": "eDP-1", "primary": true },
                 "companions": [], "companion_x": 1644 } }"#,
        );
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Catalog(CatalogError::NoCompanion(_))));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_not_found() {
        let path = std::env::temp_dir().join("gdswitch-config-test-does-not-exist.json");
        let err = Config::load(&path).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn unknown_top_level_keys_ignored() {
        let json = r#"{ "tool": {}, "future_section": { "key": 42 } }"#;
        let _cfg: Config = serde_json::from_str(json).unwrap();
    }

    #[test]
    fn explicit_backup_dir_wins() {
        let cfg: Config = serde_json::from_str(r#"{ "backup": { "dir": "/var/tmp/mon" } }"#).unwrap();
        assert_eq!(cfg.backup.resolved_dir(), PathBuf::from("/var/tmp/mon"));
    }
}
