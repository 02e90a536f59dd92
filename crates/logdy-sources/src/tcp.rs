//! Binds a listener and streams newline-delimited text from every connection.

use std::sync::Arc;

use logdy_engine::Ingress;
use logdy_protocol::{LogType, MessageOrigin};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;

/// Accepts connections on `addr` forever, spawning one reader task per
/// connection tagged with the listener's local port.
pub async fn run_tcp_listener(ingress: Arc<Ingress>, addr: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    let port = listener.local_addr()?.port();
    loop {
        let (socket, _peer) = listener.accept().await?;
        let ingress = ingress.clone();
        tokio::spawn(async move {
            let origin = MessageOrigin::from_port(port.to_string());
            let mut lines = BufReader::new(socket).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if ingress
                            .produce(line, LogType::Stdout, origin.clone())
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                    Ok(None) => return,
                    Err(err) => {
                        tracing::warn!(%err, "tcp connection reader stopped");
                        return;
                    }
                }
            }
        });
    }
}
