//! **gdswitch** — instant monitor layout switching for GNOME.
//!
//! Switches between a fixed set of known monitors and named multi-monitor
//! layouts by shelling out to `gdctl`.  Every switch is validated against
//! the monitors that are actually connected, and the previous configuration
//! is saved to a timestamped text file first.
//!
//! # Architecture
//!
//! The crate is organised around one trait and one orchestrator:
//!
//! * [`traits::DisplayTool`] — abstracts the display-configuration tool so
//!   the selection logic is not coupled to gdctl's syntax.
//! * [`switcher::MonitorSelector`] — resolves a target against the
//!   [`profile::Catalog`], checks the hardware, writes the backup and
//!   issues the single mutating call.
//!
//! The concrete backend lives in [`gdctl`].

pub mod backup;
pub mod command;
pub mod config;
pub mod environment;
pub mod gdctl;
pub mod profile;
pub mod render;
pub mod switcher;
pub mod traits;
