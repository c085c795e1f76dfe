//! The seam between the selector logic and the display-configuration tool.
//!
//! [`MonitorSelector`](crate::switcher::MonitorSelector) only depends on
//! [`DisplayTool`].  The real backend lives in [`gdctl`](crate::gdctl); tests
//! use a recording stub.

use crate::profile::{LayoutMember, Mode, Transform};
use std::time::Duration;

/// One `--logical-monitor` directive of a mutating call.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalMonitor {
    pub monitor: String,
    pub mode: Mode,
    pub x: i32,
    pub y: i32,
    pub scale: Option<f64>,
    pub transform: Option<Transform>,
    pub primary: bool,
}

impl LogicalMonitor {
    /// Build a directive from a layout member and its resolved mode.
    pub fn from_member(member: &LayoutMember, mode: Mode) -> Self {
        Self {
            monitor: member.monitor.clone(),
            mode,
            x: member.x,
            y: member.y,
            scale: member.scale,
            transform: member.transform,
            primary: member.primary,
        }
    }
}

/// Errors from running the external tool.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The program could not be started at all.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program did not finish in time and was killed.
    #[error("{program} did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    /// The program exited unsuccessfully.  `stderr` is kept verbatim.
    #[error("{stderr}")]
    Failed { status: Option<i32>, stderr: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// Text to show the user: the tool's own stderr for a failed run,
    /// otherwise a description of what went wrong.
    pub fn into_stderr(self) -> String {
        match self {
            ToolError::Failed { stderr, status } if stderr.trim().is_empty() => match status {
                Some(code) => format!("exited with status {}", code),
                None => "terminated by signal".into(),
            },
            ToolError::Failed { stderr, .. } => stderr,
            other => other.to_string(),
        }
    }
}

/// Abstraction over the display-configuration tool.
///
/// Every call is a fresh, synchronous invocation; implementations keep no
/// state between calls.
pub trait DisplayTool {
    /// Full current display state as text (`gdctl show`).
    fn show(&self) -> Result<String, ToolError>;

    /// Current state including every mode each monitor supports
    /// (`gdctl show --modes`).
    fn show_modes(&self) -> Result<String, ToolError>;

    /// Apply `monitors` atomically as the new configuration and return the
    /// tool's stdout.
    fn apply(&self, monitors: &[LogicalMonitor]) -> Result<String, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_keeps_stderr_verbatim() {
        let err = ToolError::Failed {
            status: Some(1),
            stderr: "Mode 9999x9999@1 not supported\n".into(),
        };
        assert_eq!(err.into_stderr(), "Mode 9999x9999@1 not supported\n");
    }

    #[test]
    fn failed_without_stderr_names_the_status() {
        let err = ToolError::Failed {
            status: Some(3),
            stderr: "  ".into(),
        };
        assert_eq!(err.into_stderr(), "exited with status 3");
    }

    #[test]
    fn timeout_is_described() {
        let err = ToolError::Timeout {
            program: "gdctl".into(),
            timeout: Duration::from_secs(5),
        };
        assert_eq!(err.into_stderr(), "gdctl did not finish within 5s");
    }

    #[test]
    fn from_member_copies_placement() {
        let member = LayoutMember {
            monitor: "DP-3".into(),
            mode: None,
            x: 10,
            y: 20,
            transform: Some(Transform::Rotate90),
            scale: Some(1.5),
            primary: true,
        };
        let lm = LogicalMonitor::from_member(&member, "1920x1080@60.000".parse().unwrap());
        assert_eq!(lm.monitor, "DP-3");
        assert_eq!((lm.x, lm.y), (10, 20));
        assert_eq!(lm.transform, Some(Transform::Rotate90));
        assert_eq!(lm.scale, Some(1.5));
        assert!(lm.primary);
    }
}
