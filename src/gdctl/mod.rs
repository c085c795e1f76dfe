//! GNOME `gdctl` backend.
//!
//! This module provides the concrete [`DisplayTool`](crate::traits::DisplayTool)
//! implementation ([`tool::GdctlTool`]) and the parsers for the tree-shaped
//! text that `gdctl show` prints.
//!
//! Nothing outside this module should know gdctl's command-line syntax or
//! output format.

pub mod parse;
pub mod tool;
