// src/exec/command.rs

//! Shell-command task bodies.

use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::dag::{TaskBody, TaskId};

/// Body that runs `cmd` through the platform shell.
///
/// Stdout lines are echoed to our stdout prefixed with the task id; stderr
/// is logged at debug level. A non-zero exit is a task failure. The child is
/// killed if the body is dropped early (e.g. on timeout).
pub fn shell_body(task: impl Into<TaskId>, cmd: impl Into<String>) -> TaskBody {
    let task = task.into();
    let cmd = cmd.into();
    TaskBody::new(move || async move {
        run_command(&task, &cmd).await.map_err(|err| format!("{err:#}"))
    })
}

async fn run_command(task: &str, cmd_line: &str) -> Result<()> {
    info!(task = %task, cmd = %cmd_line, "starting task process");

    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd_line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd_line);
        c
    };

    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for task '{task}'"))?;

    if let Some(stdout) = child.stdout.take() {
        let task = task.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                println!("[{task}] {line}");
            }
        });
    }

    // Always consume stderr so buffers don't fill.
    if let Some(stderr) = child.stderr.take() {
        let task = task.to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(task = %task, "stderr: {}", line);
            }
        });
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of task '{task}'"))?;

    info!(
        task = %task,
        exit_code = status.code().unwrap_or(-1),
        success = status.success(),
        "task process exited"
    );

    if !status.success() {
        match status.code() {
            Some(code) => bail!("command exited with status {code}"),
            None => bail!("command terminated by signal"),
        }
    }

    Ok(())
}
