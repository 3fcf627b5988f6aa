// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Killable subprocess execution
//!
//! Blocking work cannot be interrupted from within its own execution
//! context, so the isolated path runs it as a child process reachable
//! only through its outcome channel. When the deadline passes the child
//! is killed outright: it may be deep in an uninterruptible call, so
//! there is no graceful shutdown.

use crate::error::{GuardError, WorkFailure};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::oneshot;

/// A blocking unit of work shaped as a subprocess invocation
#[derive(Clone, Debug)]
pub struct WorkCommand {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    cwd: Option<PathBuf>,
}

impl WorkCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn build(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

/// Captured output of a successfully finished isolate
#[derive(Clone, Debug)]
pub struct WorkOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run `command` as an isolate with a hard deadline.
///
/// A reader task drains the child's pipes and publishes exactly one
/// outcome on a one-shot channel. After a clean exit the outcome is
/// waited on for at most `outcome_wait`; a finished child whose outcome
/// never arrives is a lost-outcome error, not a timeout.
pub(crate) async fn run_bounded(
    command: &WorkCommand,
    limit: Duration,
    outcome_wait: Duration,
) -> Result<WorkOutput, GuardError> {
    let mut child = command.build().spawn().map_err(GuardError::Process)?;
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        // Drain both pipes concurrently so neither can fill and block
        // the child.
        let read_out = async {
            let mut buf = String::new();
            if let Some(mut pipe) = stdout {
                let _ = pipe.read_to_string(&mut buf).await;
            }
            buf
        };
        let read_err = async {
            let mut buf = String::new();
            if let Some(mut pipe) = stderr {
                let _ = pipe.read_to_string(&mut buf).await;
            }
            buf
        };
        let captured = tokio::join!(read_out, read_err);
        let _ = tx.send(captured);
    });

    match tokio::time::timeout(limit, child.wait()).await {
        Err(_) => {
            tracing::warn!(program = %command.program, ?limit, "deadline exceeded, killing isolate");
            child.kill().await.map_err(GuardError::Process)?;
            Err(GuardError::Timeout { limit })
        }
        Ok(Err(e)) => Err(GuardError::Process(e)),
        Ok(Ok(status)) => {
            let (stdout, stderr) = match tokio::time::timeout(outcome_wait, rx).await {
                Ok(Ok(captured)) => captured,
                Ok(Err(_)) | Err(_) => return Err(GuardError::OutcomeMissing),
            };
            if status.success() {
                Ok(WorkOutput { stdout, stderr })
            } else {
                Err(GuardError::Work(WorkFailure::Command {
                    code: status.code(),
                    stderr,
                }))
            }
        }
    }
}

#[cfg(test)]
#[path = "isolate_tests.rs"]
mod tests;
