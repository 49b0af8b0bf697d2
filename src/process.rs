//! External-process execution with merged output capture and timeout.
//!
//! This is the single integration point with the external objective
//! program. All failure modes are typed errors that propagate to the top of
//! the tuner: a malfunctioning objective command invalidates the search, so
//! nothing here retries.

use core::time::Duration;
use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use parking_lot::Mutex;

use crate::error::{Error, Result};

/// How often the timeout loop polls the child for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// How a rendered command line should be executed.
///
/// The `Shell` path is the one place shell interpretation happens: it is
/// required for templates carrying shell operators (the `&&`-chained
/// hold-out evaluation, arithmetic expansions). Everything else runs as a
/// structured argv with no interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Execute `program` with `args` directly.
    Direct {
        /// The executable name, resolved via `PATH` as usual.
        program: String,
        /// The argument list, passed through verbatim.
        args: Vec<String>,
    },
    /// Execute `command` under `sh -c`.
    Shell {
        /// The full command line handed to the shell.
        command: String,
    },
}

impl Invocation {
    /// The command line as the user would type it, used in diagnostics.
    #[must_use]
    pub fn display_command(&self) -> String {
        match self {
            Self::Direct { program, args } => {
                let mut rendered = program.clone();
                for arg in args {
                    rendered.push(' ');
                    rendered.push_str(arg);
                }
                rendered
            }
            Self::Shell { command } => command.clone(),
        }
    }

    fn command(&self) -> Command {
        match self {
            Self::Direct { program, args } => {
                let mut command = Command::new(program);
                command.args(args);
                command
            }
            Self::Shell { command: line } => {
                let mut command = Command::new("sh");
                command.arg("-c").arg(line);
                command
            }
        }
    }
}

/// Runs the command to completion and returns its merged output lines.
///
/// stdout and stderr are both captured; each pipe is drained by its own
/// reader thread into one shared buffer, so a silent or stalled child can
/// never block the timeout loop. Lines are strictly ordered within each
/// stream and merged best-effort across the two.
///
/// With `timeout` set, a child that outlives the budget is killed and
/// reaped. With `progress` set (evaluation runs carry no timeout), one `.`
/// is written to stderr per captured line.
///
/// # Errors
///
/// [`Error::Run`] when the child cannot be spawned or awaited,
/// [`Error::Timeout`] when the budget is exceeded (partial output
/// attached), [`Error::Signaled`] when the child was killed by a signal,
/// and [`Error::ExitStatus`] on a non-zero exit.
pub fn run(
    invocation: &Invocation,
    timeout: Option<Duration>,
    progress: bool,
) -> Result<Vec<String>> {
    let rendered = invocation.display_command();
    tracing::debug!(command = %rendered, ?timeout, "spawning child");

    let mut command = invocation.command();
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    lead_process_group(&mut command);
    let mut child = command.spawn().map_err(|source| Error::Run {
        command: rendered.clone(),
        source,
    })?;

    let lines = Arc::new(Mutex::new(Vec::new()));
    let mut readers = Vec::with_capacity(2);
    if let Some(out) = child.stdout.take() {
        readers.push(spawn_reader(out, Arc::clone(&lines), progress));
    }
    if let Some(err) = child.stderr.take() {
        readers.push(spawn_reader(err, Arc::clone(&lines), progress));
    }

    let status = match timeout {
        Some(limit) => match wait_with_deadline(&mut child, limit, &rendered)? {
            Some(status) => status,
            None => {
                terminate(&mut child);
                for reader in readers {
                    let _ = reader.join();
                }
                let output = lines.lock().join("\n");
                return Err(Error::Timeout {
                    command: rendered,
                    timeout: limit,
                    output,
                });
            }
        },
        None => child.wait().map_err(|source| Error::Run {
            command: rendered.clone(),
            source,
        })?,
    };

    for reader in readers {
        let _ = reader.join();
    }
    if progress {
        let _ = writeln!(std::io::stderr());
    }

    let collected = core::mem::take(&mut *lines.lock());
    classify(status, rendered, collected)
}

/// Makes the child lead its own process group, so a timeout kill reaches
/// every process it forked (a `sh -c` line can leave grandchildren behind
/// that hold the output pipes open).
#[cfg(unix)]
fn lead_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;

    command.process_group(0);
}

#[cfg(not(unix))]
fn lead_process_group(_command: &mut Command) {}

/// Kills the child's whole process group and reaps the child.
#[cfg(unix)]
#[allow(clippy::cast_possible_wrap)]
fn terminate(child: &mut Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    if killpg(Pid::from_raw(child.id() as i32), Signal::SIGKILL).is_err() {
        let _ = child.kill();
    }
    let _ = child.wait();
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Maps the child's exit status onto the error taxonomy.
fn classify(status: ExitStatus, command: String, lines: Vec<String>) -> Result<Vec<String>> {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;

        if let Some(signal) = status.signal() {
            return Err(Error::Signaled {
                command,
                signal,
                core_dumped: status.core_dumped(),
                output: lines.join("\n"),
            });
        }
    }
    match status.code() {
        Some(0) => Ok(lines),
        code => Err(Error::ExitStatus {
            code: code.unwrap_or(-1),
            command,
            output: lines.join("\n"),
        }),
    }
}

fn spawn_reader<R>(
    pipe: R,
    sink: Arc<Mutex<Vec<String>>>,
    progress: bool,
) -> thread::JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let reader = BufReader::new(pipe);
        for line in reader.lines() {
            let Ok(line) = line else { break };
            if progress {
                let mut stderr = std::io::stderr();
                let _ = stderr.write_all(b".");
                let _ = stderr.flush();
            }
            sink.lock().push(line);
        }
    })
}

/// Polls the child until it exits or the deadline passes. `Ok(None)` means
/// the deadline passed with the child still running.
fn wait_with_deadline(
    child: &mut Child,
    limit: Duration,
    command: &str,
) -> Result<Option<ExitStatus>> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait().map_err(|source| Error::Run {
            command: command.to_owned(),
            source,
        })? {
            return Ok(Some(status));
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(None);
        }
        thread::sleep(remaining.min(POLL_INTERVAL));
    }
}
