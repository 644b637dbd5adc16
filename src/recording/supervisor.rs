use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// How long an interrupted encoder gets to flush and exit before it is
/// killed outright.
const INTERRUPT_GRACE: Duration = Duration::from_secs(5);

/// External encoder invocation: a binary plus its full argument list.
#[derive(Debug, Clone)]
pub struct EncoderCommand {
    binary: String,
    args: Vec<String>,
}

impl EncoderCommand {
    #[allow(dead_code)]
    pub fn new<I, S>(binary: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            binary: binary.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// The fixed recording template: synthetic video and audio test sources
    /// muxed into a single MP4 at `output`.
    pub fn recording(binary: &str, output: &Path) -> Self {
        let mut args: Vec<String> = [
            "-f",
            "lavfi",
            "-i",
            "testsrc2=duration=10:size=1280x720:rate=30",
            "-f",
            "lavfi",
            "-i",
            "sine=frequency=1000:duration=10",
            "-c:v",
            "libx264",
            "-preset",
            "ultrafast",
            "-c:a",
            "aac",
            "-shortest",
            "-y",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.push(output.display().to_string());

        Self {
            binary: binary.to_string(),
            args,
        }
    }

    fn spawn(&self) -> std::io::Result<Child> {
        // The encoder's console chatter is not consumed; leaving the pipes
        // open unbuffered would stall it once they fill.
        Command::new(&self.binary)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false)
            .spawn()
    }
}

/// Outcome of one supervised encoder process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderOutcome {
    /// The process ran and exited, on its own or after a signal.
    Exited { success: bool, code: Option<i32> },
    /// The process could not be spawned or waited on.
    Errored { message: String },
}

/// Exit report delivered to the lifecycle manager's event loop.
#[derive(Debug, Clone)]
pub struct EncoderEvent {
    pub session_id: String,
    pub outcome: EncoderOutcome,
}

/// Termination-only reference to a supervised encoder. Requesting an
/// interrupt is safe to repeat and is a no-op once the process has exited.
#[derive(Debug, Clone)]
pub struct EncoderHandle {
    interrupt: CancellationToken,
}

impl EncoderHandle {
    pub fn interrupt(&self) {
        self.interrupt.cancel();
    }
}

/// Spawn `command` for `session_id` and monitor it to completion. Returns
/// immediately; the child is owned by a background task that reports the
/// outcome on `events`. Spawn failures are reported the same way, so a
/// missing binary shows up as an event, never as an error here.
pub fn launch(
    session_id: String,
    command: EncoderCommand,
    events: mpsc::Sender<EncoderEvent>,
) -> EncoderHandle {
    let interrupt = CancellationToken::new();
    let handle = EncoderHandle {
        interrupt: interrupt.clone(),
    };

    tokio::spawn(async move {
        let outcome = monitor(&session_id, command, interrupt).await;
        if events
            .send(EncoderEvent {
                session_id,
                outcome,
            })
            .await
            .is_err()
        {
            log::debug!("Encoder: event receiver gone, exit report dropped");
        }
    });

    handle
}

async fn monitor(
    session_id: &str,
    command: EncoderCommand,
    interrupt: CancellationToken,
) -> EncoderOutcome {
    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            log::error!(
                "Encoder: failed to start {} [id:{}]: {}",
                command.binary,
                session_id,
                e
            );
            return EncoderOutcome::Errored {
                message: format!("failed to start encoder {}: {}", command.binary, e),
            };
        }
    };
    log::info!("Encoder: started [id:{}, pid:{:?}]", session_id, child.id());

    let status = tokio::select! {
        status = child.wait() => status,
        _ = interrupt.cancelled() => {
            if let Some(pid) = child.id() {
                send_interrupt(pid);
            }
            match tokio::time::timeout(INTERRUPT_GRACE, child.wait()).await {
                Ok(status) => status,
                Err(_) => {
                    log::warn!(
                        "Encoder: no exit within {:?} of interrupt, killing [id:{}]",
                        INTERRUPT_GRACE,
                        session_id
                    );
                    match child.kill().await {
                        Ok(()) => child.wait().await,
                        Err(e) => Err(e),
                    }
                }
            }
        }
    };

    match status {
        Ok(status) => {
            let success = status.success();
            if success {
                log::info!("Encoder: finished [id:{}]", session_id);
            } else {
                log::warn!(
                    "Encoder: exited abnormally [id:{}, status:{}]",
                    session_id,
                    status
                );
            }
            EncoderOutcome::Exited {
                success,
                code: status.code(),
            }
        }
        Err(e) => {
            log::error!("Encoder: wait failed [id:{}]: {}", session_id, e);
            EncoderOutcome::Errored {
                message: format!("failed to wait on encoder: {}", e),
            }
        }
    }
}

#[cfg(unix)]
fn send_interrupt(pid: u32) {
    // SIGINT asks the encoder to stop reading input and finalize the output
    // file; a zombie or already-reaped pid is harmless here.
    unsafe {
        libc::kill(pid as i32, libc::SIGINT);
    }
}

#[cfg(not(unix))]
fn send_interrupt(_pid: u32) {
    // No signal delivery here; the monitor escalates to a kill once the
    // grace window lapses.
}

#[cfg(test)]
#[path = "supervisor_test.rs"]
mod supervisor_test;
