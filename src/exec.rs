//! Structured subprocess invocation
//!
//! Every external tool - the database exporter/importer, the
//! search-replace tool, ssh, curl - is described as a [`CommandSpec`]: a
//! program plus an argument list, never a concatenated shell string, so no
//! setting value can smuggle shell syntax into an invocation. Specs are
//! executed through the [`CommandRunner`] seam; production uses
//! [`SystemRunner`], tests script the outcomes with [`ScriptedRunner`].

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::process::Command;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// One external tool invocation: program + argument list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program to execute
    pub program: String,
    /// Arguments, passed through without shell interpretation
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Start a spec for the given program
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// What came back from an external tool
///
/// The core only ever needs success/failure plus captured output; exit
/// codes and signals stay behind this boundary.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Whether the process exited with status zero
    pub success: bool,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// A successful invocation with no output
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    /// A failed invocation carrying the given stderr text
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Executes command specs
///
/// A non-zero exit is NOT an `Err` at this layer - it comes back as
/// `CommandOutput { success: false, .. }` so each call site can map it to
/// its own typed error. `Err` means the process could not be spawned at
/// all.
pub trait CommandRunner {
    /// Run one spec to completion, capturing its output
    fn run(&mut self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Runner backed by `std::process::Command`
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, spec: &CommandSpec) -> Result<CommandOutput> {
        debug!("Running: {}", spec);
        let output = Command::new(&spec.program).args(&spec.args).output()?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Scripted runner for tests
///
/// Replays queued outcomes in order (defaulting to success once the queue
/// is drained) and records every spec it was asked to run. Clones share
/// state, so a test can keep one handle for assertions while the workflow
/// owns another. An optional effect closure simulates the side effects a
/// real tool would have (e.g. the export tool writing its dump file).
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    inner: Arc<Mutex<ScriptedState>>,
}

#[derive(Default)]
struct ScriptedState {
    outcomes: VecDeque<CommandOutput>,
    calls: Vec<CommandSpec>,
    effect: Option<Box<dyn FnMut(&CommandSpec) + Send>>,
}

impl fmt::Debug for ScriptedRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock().unwrap();
        f.debug_struct("ScriptedRunner")
            .field("queued", &state.outcomes.len())
            .field("calls", &state.calls.len())
            .finish()
    }
}

impl ScriptedRunner {
    /// Runner that answers success to everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome for the next un-scripted invocation
    pub fn push(&self, outcome: CommandOutput) {
        self.inner.lock().unwrap().outcomes.push_back(outcome);
    }

    /// Install a side-effect closure invoked for every run
    pub fn set_effect(&self, effect: impl FnMut(&CommandSpec) + Send + 'static) {
        self.inner.lock().unwrap().effect = Some(Box::new(effect));
    }

    /// Everything the runner has been asked to execute, in order
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Rendered form of [`ScriptedRunner::calls`] for compact assertions
    pub fn call_lines(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.to_string()).collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&mut self, spec: &CommandSpec) -> Result<CommandOutput> {
        let mut state = self.inner.lock().unwrap();
        state.calls.push(spec.clone());
        if let Some(effect) = state.effect.as_mut() {
            effect(spec);
        }
        Ok(state.outcomes.pop_front().unwrap_or_else(CommandOutput::ok))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_whitespace_args() {
        let spec = CommandSpec::new("ssh")
            .args(["-p", "22"])
            .arg("cd /app && wp db export dump.sql");
        assert_eq!(
            spec.to_string(),
            "ssh -p 22 \"cd /app && wp db export dump.sql\""
        );
    }

    #[test]
    fn test_scripted_runner_replays_in_order() {
        let runner = ScriptedRunner::new();
        runner.push(CommandOutput::failed("boom"));

        let mut handle = runner.clone();
        let first = handle.run(&CommandSpec::new("wp").arg("db")).unwrap();
        assert!(!first.success);
        assert_eq!(first.stderr, "boom");

        // Queue drained: defaults to success.
        let second = handle.run(&CommandSpec::new("wp").arg("db")).unwrap();
        assert!(second.success);

        assert_eq!(runner.calls().len(), 2);
    }

    #[test]
    fn test_system_runner_reports_exit_status() {
        let mut runner = SystemRunner;
        let ok = runner.run(&CommandSpec::new("true")).unwrap();
        assert!(ok.success);
        let not_ok = runner.run(&CommandSpec::new("false")).unwrap();
        assert!(!not_ok.success);
    }
}
