//! The monitor selector: validate, back up, apply.
//!
//! [`MonitorSelector`] owns the [`Catalog`] and reacts to switch requests by
//! querying the [`DisplayTool`] for what is connected, refusing targets
//! whose hardware is missing, snapshotting the current state and finally
//! issuing exactly one mutating call.
//!
//! Each request is independent: nothing is cached between calls, so a
//! monitor plugged in a second ago is seen by the next request.

use crate::backup::BackupStore;
use crate::environment::{self, Environment};
use crate::gdctl::parse::{self, MonitorModes};
use crate::profile::{Catalog, Mode, Target};
use crate::traits::{DisplayTool, LogicalMonitor, ToolError};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Why a request did not switch anything.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SwitchError {
    /// The name is neither a known monitor nor a layout.
    #[error("unknown monitor or layout {target:?}")]
    UnknownTarget { target: String },

    /// Required hardware is not plugged in.  Nothing was changed.
    #[error("{target} needs {} which {} not connected", join(.missing), verb(.missing))]
    NotConnected {
        target: String,
        /// Exactly the required identifiers absent from the connected set.
        missing: BTreeSet<String>,
        /// Targets that the current hardware does satisfy.
        alternatives: Vec<String>,
        /// Everything that was connected at the time.
        connected: BTreeSet<String>,
    },

    /// The display tool failed, timed out or rejected the request.
    #[error("display tool failed: {}", .stderr.trim_end())]
    ExternalToolFailure { stderr: String },

    /// `set` was given a layout name where a single monitor is needed.
    #[error("{target} is a layout, not a single monitor")]
    NotAMonitor { target: String },

    /// gdctl does not list `mode` for `monitor`.
    #[error("{monitor} does not support mode {mode}")]
    UnsupportedMode { monitor: String, mode: String },
}

impl From<ToolError> for SwitchError {
    fn from(e: ToolError) -> Self {
        SwitchError::ExternalToolFailure {
            stderr: e.into_stderr(),
        }
    }
}

fn join(ids: &BTreeSet<String>) -> String {
    ids.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn verb(ids: &BTreeSet<String>) -> &'static str {
    if ids.len() == 1 {
        "is"
    } else {
        "are"
    }
}

/// A successfully applied switch.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    /// Canonical name of what was applied.
    pub target: String,
    /// Where the previous state was saved, if the backup succeeded.
    pub backup: Option<PathBuf>,
    /// Whatever the tool printed on stdout.
    pub output: String,
}

impl fmt::Display for Applied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "switched to {}", self.target)
    }
}

/// Orchestrates validation and switching.
///
/// The selector is generic over any [`DisplayTool`], so it does not know
/// gdctl's command-line syntax.
///
/// # Typical usage
///
/// ```ignore
/// let selector = MonitorSelector::new(GdctlTool::default(), catalog, BackupStore::new(dir));
/// selector.switch_to("triple")?;
/// ```
pub struct MonitorSelector<T: DisplayTool> {
    tool: T,
    catalog: Catalog,
    backups: BackupStore,
}

impl<T: DisplayTool> MonitorSelector<T> {
    pub fn new(tool: T, catalog: Catalog, backups: BackupStore) -> Self {
        Self {
            tool,
            catalog,
            backups,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    pub fn backups(&self) -> &BackupStore {
        &self.backups
    }

    /// Identifiers gdctl currently reports as connected.
    ///
    /// No displays is an empty set, not an error.
    pub fn list_available(&self) -> Result<BTreeSet<String>, SwitchError> {
        Ok(parse::connected(&self.tool.show()?))
    }

    /// The current configuration, verbatim.
    pub fn show_current(&self) -> Result<String, SwitchError> {
        Ok(self.tool.show()?)
    }

    /// Every connected monitor with the modes it supports.
    pub fn list_modes(&self) -> Result<Vec<MonitorModes>, SwitchError> {
        Ok(parse::monitors(&self.tool.show_modes()?))
    }

    /// Classify the desk situation for `connected`.
    pub fn environment(&self, connected: &BTreeSet<String>) -> Environment {
        environment::classify(&self.catalog, connected)
    }

    /// Catalog targets that `connected` fully satisfies.
    pub fn satisfied_targets(&self, connected: &BTreeSet<String>) -> Vec<Target<'_>> {
        self.catalog
            .targets()
            .into_iter()
            .filter(|t| t.missing(connected).is_empty())
            .collect()
    }

    /// Switch to a monitor profile or named layout.
    ///
    /// The target's hardware is checked against a fresh query before
    /// anything is changed.  The same query output becomes the backup
    /// record; a failed backup is logged and does not stop the switch.
    pub fn switch_to(&self, name: &str) -> Result<Applied, SwitchError> {
        let target = self
            .catalog
            .resolve(name)
            .ok_or_else(|| SwitchError::UnknownTarget {
                target: name.to_string(),
            })?;

        let snapshot = self.tool.show()?;
        let connected = parse::connected(&snapshot);
        debug!("connected: {:?}", connected);

        let missing = target.missing(&connected);
        if !missing.is_empty() {
            return Err(self.not_connected(target.name(), missing, &connected));
        }

        let directives = target
            .directives(&self.catalog, &connected)
            .ok_or_else(|| SwitchError::UnknownTarget {
                target: name.to_string(),
            })?;
        info!("switching to {} ({})", target.name(), target.summary());
        self.apply(target.name(), &directives, &snapshot)
    }

    /// Drive a single connected monitor at an explicit mode, as the only
    /// (primary) logical monitor.
    ///
    /// `monitor` may be a catalog name or alias, or any connector gdctl
    /// reports.  The mode must be one gdctl lists for that monitor.
    pub fn set_mode(&self, monitor: &str, mode: &Mode) -> Result<Applied, SwitchError> {
        let id = match self.catalog.resolve(monitor) {
            Some(Target::Single(profile)) => profile.id.clone(),
            Some(target) => {
                return Err(SwitchError::NotAMonitor {
                    target: target.name().to_string(),
                })
            }
            None => monitor.to_string(),
        };

        let snapshot = self.tool.show_modes()?;
        let monitors = parse::monitors(&snapshot);
        let connected: BTreeSet<String> = monitors.iter().map(|m| m.id.clone()).collect();

        let Some(info) = monitors.iter().find(|m| m.id == id) else {
            return Err(self.not_connected(&id, BTreeSet::from([id.clone()]), &connected));
        };
        if !info.supports(mode) {
            return Err(SwitchError::UnsupportedMode {
                monitor: id,
                mode: mode.to_string(),
            });
        }

        let directive = LogicalMonitor {
            monitor: id.clone(),
            mode: mode.clone(),
            x: 0,
            y: 0,
            scale: None,
            transform: None,
            primary: true,
        };
        info!("setting {} to {}", id, mode);
        self.apply(&format!("{} @ {}", id, mode), &[directive], &snapshot)
    }

    fn not_connected(
        &self,
        target: &str,
        missing: BTreeSet<String>,
        connected: &BTreeSet<String>,
    ) -> SwitchError {
        let alternatives = self
            .satisfied_targets(connected)
            .into_iter()
            .map(|t| t.name().to_string())
            .collect();
        SwitchError::NotConnected {
            target: target.to_string(),
            missing,
            alternatives,
            connected: connected.clone(),
        }
    }

    /// Back up `snapshot`, then issue the one mutating call.
    fn apply(
        &self,
        target: &str,
        directives: &[LogicalMonitor],
        snapshot: &str,
    ) -> Result<Applied, SwitchError> {
        let backup = match self.backups.write(snapshot) {
            Ok(path) => {
                info!("configuration backed up to {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("backup failed, switching anyway: {}", e);
                None
            }
        };

        let output = self.tool.apply(directives)?;
        Ok(Applied {
            target: target.to_string(),
            backup,
            output,
        })
    }
}
