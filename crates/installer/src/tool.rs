//! The external packaging tool (`npx skills` by default).

use std::{path::Path, process::Stdio};

use {
    async_trait::async_trait,
    tokio::{
        io::{AsyncBufReadExt, AsyncRead, BufReader},
        process::Command,
        sync::mpsc,
        task::JoinHandle,
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, warn},
};

use crate::{
    ansi::strip_ansi,
    error::{Context, Error, Result},
};

/// Runs one packaging-tool operation.
#[async_trait]
pub trait PackageTool: Send + Sync {
    /// Run `<tool> <args..>` in `cwd` and return its ANSI-stripped stdout.
    ///
    /// A non-zero exit is [`Error::Subprocess`]; cancellation kills the child
    /// and yields [`Error::Cancelled`].
    async fn run(&self, args: &[String], cwd: &Path, cancel: &CancellationToken) -> Result<String>;
}

/// Subprocess-backed [`PackageTool`].
///
/// In capture mode output is only returned. In streaming mode every line of
/// stdout and stderr is also forwarded to the sink as it arrives.
#[derive(Debug, Clone)]
pub struct CommandTool {
    program: String,
    leading_args: Vec<String>,
    sink: Option<mpsc::UnboundedSender<String>>,
}

impl CommandTool {
    /// `command` is the program followed by any fixed leading arguments,
    /// e.g. `["npx", "skills"]`.
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, leading) = command
            .split_first()
            .context("packaging tool command is empty")?;
        Ok(Self {
            program: program.clone(),
            leading_args: leading.to_vec(),
            sink: None,
        })
    }

    /// Forward output lines to `sink` while the tool runs.
    #[must_use]
    pub fn streaming(mut self, sink: mpsc::UnboundedSender<String>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn command_line(&self, args: &[String]) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.leading_args.iter().map(String::as_str))
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl PackageTool for CommandTool {
    async fn run(&self, args: &[String], cwd: &Path, cancel: &CancellationToken) -> Result<String> {
        let command_line = self.command_line(args);
        debug!(cwd = %cwd.display(), command = %command_line, "running packaging tool");

        let mut child = Command::new(&self.program)
            .args(&self.leading_args)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {command_line}"))?;

        let stdout = child
            .stdout
            .take()
            .map(|out| tokio::spawn(collect_lines(out, self.sink.clone())));
        let stderr = child
            .stderr
            .take()
            .map(|err| tokio::spawn(collect_lines(err, self.sink.clone())));

        let status = tokio::select! {
            status = child.wait() => status?,
            () = cancel.cancelled() => {
                warn!(command = %command_line, "cancelling packaging tool");
                let _ = child.kill().await;
                return Err(Error::Cancelled);
            }
        };

        let stdout = join_output(stdout).await;
        let stderr = join_output(stderr).await;

        if !status.success() {
            return Err(Error::Subprocess {
                command: command_line,
                code: status.code(),
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(stdout)
    }
}

async fn collect_lines<R>(reader: R, sink: Option<mpsc::UnboundedSender<String>>) -> String
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut collected = String::new();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = strip_ansi(&line).into_owned();
        if let Some(ref sink) = sink {
            let _ = sink.send(line.clone());
        }
        collected.push_str(&line);
        collected.push('\n');
    }
    collected
}

async fn join_output(handle: Option<JoinHandle<String>>) -> String {
    match handle {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    }
}

/// `--agent <id>` per reader, skipping the universal directory id. With no
/// agents left the tool is told to target every agent.
pub fn agent_args<S: AsRef<str>>(reader_ids: &[S]) -> Vec<String> {
    let args: Vec<String> = reader_ids
        .iter()
        .map(AsRef::as_ref)
        .filter(|id| *id != skillknife_config::UNIVERSAL_READER_ID)
        .flat_map(|id| ["--agent".to_string(), id.to_string()])
        .collect();
    if args.is_empty() {
        vec!["--all".into()]
    } else {
        args
    }
}
