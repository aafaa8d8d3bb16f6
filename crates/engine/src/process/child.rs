use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Instant;

use livematch_primitives::CancelToken;
use livematch_worker::{TaskClass, spawn};
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;

use super::ProcessShared;
use crate::{EngineConfig, EngineError};

/// Text collected line by line from one output stream.
#[derive(Clone, Default)]
struct Accumulator(Arc<Mutex<String>>);

impl Accumulator {
	fn push_line(&self, line: &[u8]) {
		self.0.lock().push_str(&String::from_utf8_lossy(line));
	}

	fn take(&self) -> String {
		std::mem::take(&mut *self.0.lock())
	}
}

/// Background I/O attached to one child.
struct Pipes {
	writer: JoinHandle<()>,
	stdout: JoinHandle<()>,
	stderr: JoinHandle<()>,
}

impl Pipes {
	fn abort(&self) {
		self.writer.abort();
		self.stdout.abort();
		self.stderr.abort();
	}
}

fn command(config: &EngineConfig) -> Command {
	let mut cmd = Command::new(&config.program);
	cmd.args(&config.args)
		.envs(&config.env)
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.kill_on_drop(true);
	if let Some(dir) = &config.working_dir {
		cmd.current_dir(dir);
	}
	#[cfg(windows)]
	{
		const CREATE_NO_WINDOW: u32 = 0x0800_0000;
		cmd.creation_flags(CREATE_NO_WINDOW);
	}
	cmd
}

fn spawn_error(config: &EngineConfig, reason: impl Into<String>) -> EngineError {
	EngineError::Spawn {
		program: config.program.display().to_string(),
		reason: reason.into(),
	}
}

async fn write_request(mut stdin: ChildStdin, request: String, engine: String) {
	let written = async {
		stdin.write_all(request.as_bytes()).await?;
		stdin.shutdown().await
	}
	.await;
	// Engines may exit before reading everything; what they print decides the outcome.
	if let Err(err) = written {
		tracing::debug!(%engine, error = %err, "engine.stdin_closed_early");
	}
}

async fn accumulate(stream: impl AsyncRead + Unpin, into: Accumulator) {
	let mut reader = BufReader::new(stream);
	let mut line = Vec::new();
	loop {
		line.clear();
		match reader.read_until(b'\n', &mut line).await {
			Ok(0) => break,
			Ok(_) => into.push_line(&line),
			Err(err) => {
				tracing::debug!(error = %err, "engine.stream_read_failed");
				break;
			}
		}
	}
}

/// Runs the engine once.
///
/// Returns the complete standard output, or `None` if `cancel` fired before
/// the engine exited, in which case the child has been killed.
pub(super) async fn run(shared: &ProcessShared, request: String, cancel: &CancelToken) -> Result<Option<String>, EngineError> {
	let config = &shared.config;
	let mut child = command(config).spawn().map_err(|e| spawn_error(config, e.to_string()))?;
	let started = Instant::now();
	let pid = child.id();
	tracing::debug!(engine = %config.name, pid, "engine.spawned");

	let stdin = child.stdin.take().ok_or_else(|| spawn_error(config, "failed to capture stdin"))?;
	let stdout = child.stdout.take().ok_or_else(|| spawn_error(config, "failed to capture stdout"))?;
	let stderr = child.stderr.take().ok_or_else(|| spawn_error(config, "failed to capture stderr"))?;

	let out = Accumulator::default();
	let err = Accumulator::default();
	let mut pipes = Pipes {
		writer: spawn(TaskClass::Background, write_request(stdin, request, config.name.clone())),
		stdout: spawn(TaskClass::Background, accumulate(stdout, out.clone())),
		stderr: spawn(TaskClass::Background, accumulate(stderr, err.clone())),
	};

	let slice = config.poll_slice();
	let status = loop {
		if cancel.is_cancelled() {
			kill(shared, &mut child, pid).await;
			pipes.abort();
			return Ok(None);
		}
		tokio::select! {
			biased;
			() = cancel.cancelled() => {}
			waited = tokio::time::timeout(slice, child.wait()) => match waited {
				Ok(status) => break status?,
				Err(_) => tracing::trace!(engine = %config.name, pid, "engine.poll"),
			},
		}
	};

	// Exit can be observed before the readers have seen end-of-stream.
	let drained = tokio::time::timeout(config.drain_timeout(), async {
		let _ = (&mut pipes.stdout).await;
		let _ = (&mut pipes.stderr).await;
	})
	.await;
	if drained.is_err() {
		tracing::warn!(engine = %config.name, pid, "engine output still open after exit; using what was read");
	}
	pipes.abort();

	let stderr = err.take();
	tracing::debug!(
		engine = %config.name,
		pid,
		%status,
		elapsed_ms = started.elapsed().as_millis() as u64,
		stderr_bytes = stderr.len(),
		"engine.exited"
	);
	if !stderr.is_empty() {
		return Err(EngineError::Engine(stderr));
	}
	if !status.success() {
		return Err(EngineError::Exit(status));
	}
	Ok(Some(out.take()))
}

/// Kills a cancelled child and checks that it went away.
async fn kill(shared: &ProcessShared, child: &mut Child, pid: Option<u32>) {
	let config = &shared.config;
	if let Err(err) = child.start_kill() {
		tracing::debug!(engine = %config.name, pid, error = %err, "engine.kill_failed");
	}
	match tokio::time::timeout(config.poll_slice(), child.wait()).await {
		Ok(Ok(status)) => tracing::debug!(engine = %config.name, pid, %status, "engine.killed"),
		Ok(Err(err)) => {
			let leaked = shared.leaked.fetch_add(1, Ordering::Relaxed) + 1;
			tracing::warn!(engine = %config.name, pid, error = %err, leaked, "engine process state unknown after kill");
		}
		Err(_) => {
			let leaked = shared.leaked.fetch_add(1, Ordering::Relaxed) + 1;
			tracing::warn!(engine = %config.name, pid, leaked, "engine process still alive after kill");
		}
	}
}
