//! The monitor table: profiles, layouts and target resolution.
//!
//! A [`Catalog`] is built once at start-up from the
//! [`Config`](crate::config::Config) and never mutated afterwards.  Every
//! switch request is resolved against it into a [`Target`], which knows
//! which hardware identifiers it needs and how to turn itself into
//! [`LogicalMonitor`] directives.

use crate::traits::LogicalMonitor;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

//  Mode

/// A display mode in gdctl notation: `WIDTHxHEIGHT@REFRESH`.
///
/// The refresh component is kept verbatim (`"100.006"`, not `100.006_f64`)
/// because gdctl matches modes textually.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mode {
    pub width: u32,
    pub height: u32,
    refresh: String,
}

/// Error returned when a string is not a `WIDTHxHEIGHT@REFRESH` mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid mode {0:?}, expected WIDTHxHEIGHT@REFRESH")]
pub struct ModeParseError(String);

impl Mode {
    /// Build a mode from its parts.  `refresh` is kept as given.
    pub fn new(width: u32, height: u32, refresh: &str) -> Self {
        Self {
            width,
            height,
            refresh: refresh.to_string(),
        }
    }

    /// The refresh rate exactly as gdctl prints it.
    pub fn refresh(&self) -> &str {
        &self.refresh
    }

    /// The refresh rate in Hz, for ordering.
    pub fn refresh_hz(&self) -> f64 {
        // Validated in `from_str`.
        self.refresh.parse().unwrap_or(0.0)
    }

    /// `WIDTHxHEIGHT` without the refresh rate.
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    /// Total pixel count, used to find the native resolution.
    pub fn pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}@{}", self.width, self.height, self.refresh)
    }
}

impl FromStr for Mode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ModeParseError(s.to_string());
        let (resolution, refresh) = s.trim().split_once('@').ok_or_else(err)?;
        let (w, h) = resolution.split_once('x').ok_or_else(err)?;
        let width: u32 = w.parse().map_err(|_| err())?;
        let height: u32 = h.parse().map_err(|_| err())?;
        let hz: f64 = refresh.parse().map_err(|_| err())?;
        if width == 0 || height == 0 || !hz.is_finite() || hz <= 0.0 {
            return Err(err());
        }
        Ok(Mode {
            width,
            height,
            refresh: refresh.to_string(),
        })
    }
}

impl Serialize for Mode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(DeError::custom)
    }
}

//  Transform

/// Output transform accepted by `gdctl set --transform`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transform {
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "90")]
    Rotate90,
    #[serde(rename = "180")]
    Rotate180,
    #[serde(rename = "270")]
    Rotate270,
    #[serde(rename = "flipped")]
    Flipped,
    #[serde(rename = "flipped-90")]
    Flipped90,
    #[serde(rename = "flipped-180")]
    Flipped180,
    #[serde(rename = "flipped-270")]
    Flipped270,
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Transform::Normal => "normal",
            Transform::Rotate90 => "90",
            Transform::Rotate180 => "180",
            Transform::Rotate270 => "270",
            Transform::Flipped => "flipped",
            Transform::Flipped90 => "flipped-90",
            Transform::Flipped180 => "flipped-180",
            Transform::Flipped270 => "flipped-270",
        };
        f.write_str(s)
    }
}

//  Profiles and layouts

/// One physical display the user owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorProfile {
    /// Connector name as gdctl reports it, e.g. `DP-2`.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub description: String,
    /// Highest mode the monitor supports; used for single-monitor switches.
    pub max_mode: Mode,
    /// `true` for the laptop's internal panel.
    #[serde(default)]
    pub builtin: bool,
}

/// One monitor's placement inside a [`LayoutSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutMember {
    pub monitor: String,
    /// Overrides the profile's `max_mode` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default)]
    pub primary: bool,
}

/// A named multi-monitor arrangement, e.g. `triple`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub members: Vec<LayoutMember>,
}

/// A laptop-plus-one-external arrangement for travel setups.
///
/// The anchor (normally the builtin panel) sits at its fixed offset; the
/// first connected entry of `companions` is placed at `companion_x`,
/// `companion_y` and becomes primary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualSpec {
    pub name: String,
    pub anchor: LayoutMember,
    /// In priority order.
    pub companions: Vec<Companion>,
    pub companion_x: i32,
    #[serde(default)]
    pub companion_y: i32,
}

/// A candidate external monitor for a [`DualSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Companion {
    pub monitor: String,
    pub mode: Mode,
}

//  Catalog

/// Error raised when the monitor table is inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("monitor {0:?} is defined more than once")]
    DuplicateMonitor(String),
    #[error("layout {0:?} is defined more than once")]
    DuplicateLayout(String),
    #[error("target name {0:?} is used by both a monitor and a layout")]
    NameClash(String),
    #[error("layout {layout:?} references unknown monitor {monitor:?}")]
    UnknownMember { layout: String, monitor: String },
    #[error("layout {layout:?} lists monitor {monitor:?} twice")]
    RepeatedMember { layout: String, monitor: String },
    #[error("layout {layout:?} must have exactly one primary monitor, found {count}")]
    Primary { layout: String, count: usize },
    #[error("layout {0:?} has no members")]
    EmptyLayout(String),
    #[error("dual layout {0:?} has no companion other than its anchor")]
    NoCompanion(String),
}

/// Immutable monitor table, built once per process.
#[derive(Debug, Clone)]
pub struct Catalog {
    monitors: BTreeMap<String, MonitorProfile>,
    layouts: BTreeMap<String, LayoutSpec>,
    dual: Option<DualSpec>,
}

/// A resolved switch request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target<'a> {
    Single(&'a MonitorProfile),
    Layout(&'a LayoutSpec),
    Dual(&'a DualSpec),
}

/// Normalise a target spelling so shell-alias forms (`dp2`, `EDP_1`)
/// match the canonical connector name.
fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| *c != '-' && *c != '_' && !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

impl Catalog {
    /// Build and validate a catalog.
    pub fn new(
        monitors: Vec<MonitorProfile>,
        layouts: Vec<LayoutSpec>,
        dual: Option<DualSpec>,
    ) -> Result<Self, CatalogError> {
        let mut by_id = BTreeMap::new();
        for m in monitors {
            let id = m.id.clone();
            if by_id.insert(id.clone(), m).is_some() {
                return Err(CatalogError::DuplicateMonitor(id));
            }
        }

        let mut by_name = BTreeMap::new();
        for layout in layouts {
            validate_layout(&layout, &by_id)?;
            let name = layout.name.clone();
            if by_id.contains_key(&name) {
                return Err(CatalogError::NameClash(name));
            }
            if by_name.insert(name.clone(), layout).is_some() {
                return Err(CatalogError::DuplicateLayout(name));
            }
        }

        if let Some(ref d) = dual {
            if by_id.contains_key(&d.name) || by_name.contains_key(&d.name) {
                return Err(CatalogError::NameClash(d.name.clone()));
            }
            if d.anchor.mode.is_none() && !by_id.contains_key(&d.anchor.monitor) {
                return Err(CatalogError::UnknownMember {
                    layout: d.name.clone(),
                    monitor: d.anchor.monitor.clone(),
                });
            }
            if candidates(d).next().is_none() {
                return Err(CatalogError::NoCompanion(d.name.clone()));
            }
        }

        Ok(Self {
            monitors: by_id,
            layouts: by_name,
            dual,
        })
    }

    /// All known monitor profiles, ordered by id.
    pub fn monitors(&self) -> impl Iterator<Item = &MonitorProfile> {
        self.monitors.values()
    }

    pub fn monitor(&self, id: &str) -> Option<&MonitorProfile> {
        self.monitors.get(id)
    }

    pub fn layouts(&self) -> impl Iterator<Item = &LayoutSpec> {
        self.layouts.values()
    }

    pub fn dual(&self) -> Option<&DualSpec> {
        self.dual.as_ref()
    }

    /// The laptop panel, if one is marked `builtin`.
    pub fn builtin(&self) -> Option<&MonitorProfile> {
        self.monitors.values().find(|m| m.builtin)
    }

    /// Every target in display order: monitors, layouts, then dual.
    pub fn targets(&self) -> Vec<Target<'_>> {
        self.monitors
            .values()
            .map(Target::Single)
            .chain(self.layouts.values().map(Target::Layout))
            .chain(self.dual.iter().map(Target::Dual))
            .collect()
    }

    /// Resolve a user-supplied name.
    ///
    /// Exact matches win; otherwise the comparison ignores case, `-` and
    /// `_`, so `dp2` finds `DP-2`.
    pub fn resolve(&self, name: &str) -> Option<Target<'_>> {
        if let Some(m) = self.monitors.get(name) {
            return Some(Target::Single(m));
        }
        if let Some(l) = self.layouts.get(name) {
            return Some(Target::Layout(l));
        }
        if let Some(d) = self.dual.as_ref().filter(|d| d.name == name) {
            return Some(Target::Dual(d));
        }
        let wanted = normalize(name);
        if wanted.is_empty() {
            return None;
        }
        self.targets()
            .into_iter()
            .find(|t| normalize(t.name()) == wanted)
    }
}

fn validate_layout(
    layout: &LayoutSpec,
    monitors: &BTreeMap<String, MonitorProfile>,
) -> Result<(), CatalogError> {
    if layout.members.is_empty() {
        return Err(CatalogError::EmptyLayout(layout.name.clone()));
    }
    let mut seen = BTreeSet::new();
    for member in &layout.members {
        if !monitors.contains_key(&member.monitor) {
            return Err(CatalogError::UnknownMember {
                layout: layout.name.clone(),
                monitor: member.monitor.clone(),
            });
        }
        if !seen.insert(member.monitor.as_str()) {
            return Err(CatalogError::RepeatedMember {
                layout: layout.name.clone(),
                monitor: member.monitor.clone(),
            });
        }
    }
    let primaries = layout.members.iter().filter(|m| m.primary).count();
    if primaries != 1 {
        return Err(CatalogError::Primary {
            layout: layout.name.clone(),
            count: primaries,
        });
    }
    Ok(())
}

//  Target

/// Companions of `d` that are not the anchor itself, in priority order.
fn candidates(d: &DualSpec) -> impl Iterator<Item = &Companion> {
    d.companions
        .iter()
        .filter(move |c| c.monitor != d.anchor.monitor)
}

impl<'a> Target<'a> {
    /// The name the user types to select this target.
    pub fn name(&self) -> &'a str {
        match *self {
            Target::Single(m) => &m.id,
            Target::Layout(l) => &l.name,
            Target::Dual(d) => &d.name,
        }
    }

    /// Identifiers that must be connected before switching.
    ///
    /// For a dual target only the anchor is unconditionally required; at
    /// least one companion must also be present (see [`Target::missing`]).
    pub fn required(&self) -> BTreeSet<String> {
        match self {
            Target::Single(m) => BTreeSet::from([m.id.clone()]),
            Target::Layout(l) => l.members.iter().map(|m| m.monitor.clone()).collect(),
            Target::Dual(d) => BTreeSet::from([d.anchor.monitor.clone()]),
        }
    }

    /// Hardware that would have to be connected for this target to apply.
    ///
    /// Empty when the target is satisfied by `connected`.  For a dual
    /// target with the anchor present but no companion connected, every
    /// companion is reported missing.  A dual spec with no candidates at
    /// all is never satisfied.
    pub fn missing(&self, connected: &BTreeSet<String>) -> BTreeSet<String> {
        let missing: BTreeSet<String> = self.required().difference(connected).cloned().collect();
        if let Target::Dual(d) = *self {
            if missing.is_empty() && self.companion(connected).is_none() {
                let wanted: BTreeSet<String> = candidates(d).map(|c| c.monitor.clone()).collect();
                if wanted.is_empty() {
                    return BTreeSet::from([format!("a companion for {}", d.anchor.monitor)]);
                }
                return wanted;
            }
        }
        missing
    }

    /// The companion a dual target would use, if any is connected.
    pub fn companion(&self, connected: &BTreeSet<String>) -> Option<&'a Companion> {
        match *self {
            Target::Dual(d) => candidates(d).find(|c| connected.contains(&c.monitor)),
            _ => None,
        }
    }

    /// Build the gdctl directives for this target.
    ///
    /// `catalog` supplies the profile modes for layout members without an
    /// override.  Returns `None` when the target cannot be applied to
    /// `connected`; callers check [`Target::missing`] first.
    pub fn directives(
        &self,
        catalog: &Catalog,
        connected: &BTreeSet<String>,
    ) -> Option<Vec<LogicalMonitor>> {
        match self {
            Target::Single(m) => Some(vec![LogicalMonitor {
                monitor: m.id.clone(),
                mode: m.max_mode.clone(),
                x: 0,
                y: 0,
                scale: None,
                transform: None,
                primary: true,
            }]),
            Target::Layout(l) => l
                .members
                .iter()
                .map(|member| {
                    let mode = match member.mode {
                        Some(ref mode) => mode.clone(),
                        None => catalog.monitor(&member.monitor)?.max_mode.clone(),
                    };
                    Some(LogicalMonitor::from_member(member, mode))
                })
                .collect(),
            Target::Dual(d) => {
                let companion = self.companion(connected)?;
                let anchor_mode = match d.anchor.mode {
                    Some(ref mode) => mode.clone(),
                    None => catalog.monitor(&d.anchor.monitor)?.max_mode.clone(),
                };
                let mut anchor = LogicalMonitor::from_member(&d.anchor, anchor_mode);
                anchor.primary = false;
                Some(vec![
                    anchor,
                    LogicalMonitor {
                        monitor: companion.monitor.clone(),
                        mode: companion.mode.clone(),
                        x: d.companion_x,
                        y: d.companion_y,
                        scale: None,
                        transform: None,
                        primary: true,
                    },
                ])
            }
        }
    }

    /// One-line human description.
    pub fn summary(&self) -> String {
        match self {
            Target::Single(m) => format!("Switch to {}", m.name),
            Target::Layout(l) if !l.description.is_empty() => l.description.clone(),
            Target::Layout(l) => format!("{}-monitor layout", l.members.len()),
            Target::Dual(d) => format!("{} + one external monitor", d.anchor.monitor),
        }
    }
}
