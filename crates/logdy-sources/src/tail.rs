//! Polls a file for appended lines, the way `tail -f` does.

use std::io::SeekFrom;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use logdy_engine::Ingress;
use logdy_protocol::{LogType, MessageOrigin};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Tails `path` forever, reseeking to the start if the file shrinks (log
/// rotation or truncation) out from under us.
pub async fn run_file_tailer(ingress: Arc<Ingress>, path: &Path, from_beginning: bool) -> std::io::Result<()> {
    let mut file = File::open(path).await?;
    let mut known_len = file.metadata().await?.len();
    let mut offset = if from_beginning { 0 } else { known_len };
    file.seek(SeekFrom::Start(offset)).await?;
    let mut reader = BufReader::new(file);
    let origin = MessageOrigin::from_file(path.to_string_lossy().into_owned());

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                tokio::time::sleep(POLL_INTERVAL).await;
                let current_len = tokio::fs::metadata(path).await?.len();
                if current_len < known_len {
                    // truncated or rotated out from under us: restart from 0
                    let mut reopened = File::open(path).await?;
                    reopened.seek(SeekFrom::Start(0)).await?;
                    reader = BufReader::new(reopened);
                    offset = 0;
                }
                known_len = current_len;
            }
            Ok(n) => {
                offset += n as u64;
                let line = line.trim_end_matches('\n').trim_end_matches('\r');
                if !line.is_empty() {
                    if ingress
                        .produce(line.to_owned(), LogType::Stdout, origin.clone())
                        .await
                        .is_err()
                    {
                        return Ok(());
                    }
                }
            }
            Err(err) => return Err(err),
        }
    }
}
