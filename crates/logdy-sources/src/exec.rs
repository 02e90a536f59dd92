//! Spawns a child process and streams its stdout/stderr into the engine.

use std::process::Stdio;
use std::sync::Arc;

use logdy_engine::Ingress;
use logdy_protocol::{LogType, MessageOrigin};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Runs `program args...`, reading stdout and stderr concurrently on
/// separate tasks. Returns once the child exits and both readers drain.
pub async fn run_child_process(ingress: Arc<Ingress>, program: &str, args: &[String]) -> std::io::Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = child.stdout.take().expect("piped stdout requested at spawn");
    let stderr = child.stderr.take().expect("piped stderr requested at spawn");

    let stdout_task = tokio::spawn(pump_lines(ingress.clone(), stdout, LogType::Stdout));
    let stderr_task = tokio::spawn(pump_lines(ingress, stderr, LogType::Stderr));

    let _ = child.wait().await;
    let _ = stdout_task.await;
    let _ = stderr_task.await;
    Ok(())
}

async fn pump_lines(ingress: Arc<Ingress>, reader: impl tokio::io::AsyncRead + Unpin, log_type: LogType) {
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if ingress.produce(line, log_type, MessageOrigin::default()).await.is_err() {
                    return;
                }
            }
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(%err, "child process reader stopped");
                return;
            }
        }
    }
}
