//! [`DisplayTool`] implementation that shells out to `gdctl`.
//!
//! Each call spawns one short-lived child process.  Output pipes are
//! drained on helper threads while the main thread polls for exit, so a
//! child that prints a lot cannot stall on a full pipe, and a child that
//! hangs is killed once the timeout expires.

use crate::config::ToolConfig;
use crate::traits::{DisplayTool, LogicalMonitor, ToolError};
use log::debug;
use std::io::{self, Read};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// How often a running child is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Bytes kept from each output pipe; anything beyond is read and dropped.
const MAX_OUTPUT: u64 = 4 * 1024 * 1024;

/// gdctl-backed display tool.
#[derive(Debug, Clone)]
pub struct GdctlTool {
    program: String,
    timeout: Duration,
    verbose: bool,
}

impl Default for GdctlTool {
    fn default() -> Self {
        Self::new(&ToolConfig::default())
    }
}

impl GdctlTool {
    pub fn new(config: &ToolConfig) -> Self {
        Self {
            program: config.program.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
            verbose: config.verbose,
        }
    }

    /// Run the program with `args` and return its stdout.
    fn run(&self, args: &[String]) -> Result<String, ToolError> {
        debug!("running {} {}", self.program, args.join(" "));
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ToolError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let start = Instant::now();
        let status = loop {
            let polled = match child.try_wait() {
                Ok(polled) => polled,
                Err(e) => {
                    reap(&mut child);
                    return Err(e.into());
                }
            };
            match polled {
                Some(status) => break status,
                None if start.elapsed() > self.timeout => {
                    reap(&mut child);
                    return Err(ToolError::Timeout {
                        program: self.program.clone(),
                        timeout: self.timeout,
                    });
                }
                None => std::thread::sleep(POLL_INTERVAL),
            }
        };

        let stdout = collect(stdout);
        let stderr = collect(stderr);
        if status.success() {
            Ok(stdout)
        } else {
            Err(ToolError::Failed {
                status: status.code(),
                stderr,
            })
        }
    }
}

/// Kill and reap a child that is being abandoned.
fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Read a pipe to the end on a helper thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.by_ref().take(MAX_OUTPUT).read_to_end(&mut buf);
            let _ = io::copy(&mut pipe, &mut io::sink());
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// Build the argument list for `gdctl set`.
pub fn set_args(monitors: &[LogicalMonitor], verbose: bool) -> Vec<String> {
    let mut args = vec!["set".to_string()];
    if verbose {
        args.push("--verbose".into());
    }
    for lm in monitors {
        args.push("--logical-monitor".into());
        if lm.primary {
            args.push("--primary".into());
        }
        args.push("--monitor".into());
        args.push(lm.monitor.clone());
        args.push("--mode".into());
        args.push(lm.mode.to_string());
        if let Some(scale) = lm.scale {
            args.push("--scale".into());
            args.push(scale.to_string());
        }
        if let Some(transform) = lm.transform {
            args.push("--transform".into());
            args.push(transform.to_string());
        }
        args.push("--x".into());
        args.push(lm.x.to_string());
        args.push("--y".into());
        args.push(lm.y.to_string());
    }
    args
}

impl DisplayTool for GdctlTool {
    fn show(&self) -> Result<String, ToolError> {
        self.run(&["show".to_string()])
    }

    fn show_modes(&self) -> Result<String, ToolError> {
        self.run(&["show".to_string(), "--modes".to_string()])
    }

    fn apply(&self, monitors: &[LogicalMonitor]) -> Result<String, ToolError> {
        self.run(&set_args(monitors, self.verbose))
    }
}
