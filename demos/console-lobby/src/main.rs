//! Runs a Matchroom server against stdin/stdout.
//!
//! Each stdin line is one inbound event, either JSON
//! (`{"from":1,"body":{"type":"Text","data":"/register a Ada"}}`) or the
//! shorthand `1: /register a Ada`. Each outbound delivery is printed as one
//! JSON line. Finished transcripts are written to `./transcripts/`.
//!
//! ```text
//! cargo run -p console-lobby -- matchroom.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use matchroom::prelude::*;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::sync::{Mutex, mpsc};

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Prints deliveries as JSON lines.
struct ConsoleTransport {
    stdout: Arc<Mutex<Stdout>>,
    codec: JsonCodec,
}

impl ConsoleTransport {
    async fn write(&self, delivery: &Delivery) -> Result<(), TransportError> {
        let mut line = self
            .codec
            .encode(delivery)
            .map_err(|e| TransportError::SendFailed(std::io::Error::other(e)))?;
        line.push(b'\n');
        let mut stdout = self.stdout.lock().await;
        stdout
            .write_all(&line)
            .await
            .map_err(TransportError::SendFailed)?;
        stdout.flush().await.map_err(TransportError::SendFailed)
    }
}

impl Transport for ConsoleTransport {
    async fn send_text(&self, to: ParticipantId, text: &str) -> Result<(), TransportError> {
        self.write(&Delivery {
            to,
            message: Outbound::text(text),
        })
        .await
    }

    async fn send_document(
        &self,
        to: ParticipantId,
        bytes: &[u8],
        filename: &str,
        caption: &str,
    ) -> Result<(), TransportError> {
        self.write(&Delivery {
            to,
            message: Outbound::Document {
                bytes: bytes.to_vec(),
                filename: filename.to_string(),
                caption: caption.to_string(),
            },
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

fn parse_line(codec: &JsonCodec, line: &str) -> Option<Inbound> {
    let line = line.trim();
    if line.starts_with('{') {
        return match codec.decode(line.as_bytes()) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed event");
                None
            }
        };
    }
    let (id, text) = line.split_once(':')?;
    let from: ParticipantId = id.parse().ok()?;
    Some(Inbound::text(from, text.trim()))
}

async fn persist_transcripts(mut finished: mpsc::UnboundedReceiver<FinishedRoom>, dir: PathBuf) {
    while let Some(done) = finished.recv().await {
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            tracing::error!(error = %e, dir = %dir.display(), "cannot create transcript directory");
            continue;
        }
        let path = dir.join(&done.filename);
        match tokio::fs::write(&path, done.document.as_bytes()).await {
            Ok(()) => {
                tracing::info!(room_id = %done.room_id, path = %path.display(), "transcript saved")
            }
            Err(e) => {
                tracing::error!(room_id = %done.room_id, error = %e, "failed to save transcript")
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), MatchroomError> {
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    init_tracing(&config.log_filter);

    let (sink, finished) = mpsc::unbounded_channel();
    let transport = ConsoleTransport {
        stdout: Arc::new(Mutex::new(tokio::io::stdout())),
        codec: JsonCodec,
    };
    let server = MatchroomServerBuilder::new()
        .config(config)
        .transcript_sink(sink)
        .build(transport);
    let handle = server.handle();
    let server_task = tokio::spawn(server.run());
    let persist_task = tokio::spawn(persist_transcripts(finished, PathBuf::from("transcripts")));

    let codec = JsonCodec;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to read stdin");
                        break;
                    }
                };
                if let Some(event) = parse_line(&codec, &line) {
                    handle.submit(event).await?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
        }
    }

    handle.shutdown().await?;
    drop(handle);
    match server_task.await {
        Ok(result) => result?,
        Err(e) => tracing::error!(error = %e, "server task panicked"),
    }
    let _ = persist_task.await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorthand_line() {
        let event = parse_line(&JsonCodec, "P-3:  /register b Bo").unwrap();
        assert_eq!(event, Inbound::text(ParticipantId(3), "/register b Bo"));
    }

    #[test]
    fn test_json_line() {
        let event =
            parse_line(&JsonCodec, r#"{"from":1,"body":{"type":"Text","data":"2"}}"#).unwrap();
        assert_eq!(event.from, ParticipantId(1));
        assert_eq!(event.as_text(), Some("2"));
    }

    #[test]
    fn test_garbage_is_skipped() {
        assert!(parse_line(&JsonCodec, "no separator here").is_none());
        assert!(parse_line(&JsonCodec, "{broken").is_none());
    }
}
