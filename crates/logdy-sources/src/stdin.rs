//! Reads lines off the process's stdin until EOF.

use std::sync::Arc;

use logdy_engine::Ingress;
use logdy_protocol::{LogType, MessageOrigin};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Runs until stdin closes. A closed stdin ends the task without affecting
/// the engine — there is nothing to report back.
pub async fn run_stdin_reader(ingress: Arc<Ingress>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if ingress
                    .produce(line, LogType::Stdout, MessageOrigin::default())
                    .await
                    .is_err()
                {
                    return;
                }
            }
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(%err, "stdin reader stopped");
                return;
            }
        }
    }
}
