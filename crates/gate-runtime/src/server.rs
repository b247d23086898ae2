//! # Line-Delimited JSON Request Loop
//!
//! One request per line on stdin, one response per line on stdout:
//!
//! ```text
//! → {"id": 1, "method": "check_suppression", "params": {"identifier": "hash_abc"}}
//! ← {"id": 1, "result": {"suppressed_advertisers": ["adv1"], "check_time_ms": 0}}
//! ```
//!
//! Input lines are read on a dedicated OS thread and handed to the loop over
//! a channel. A blocked read never holds up shutdown: the loop stops on the
//! shutdown signal and the reader thread dies with the process.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::BufRead;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use suppression_gate::{handle_api_query, ApiGatewayHandler, ApiQueryError};

/// Error code for a line that is not a valid request object.
pub const PARSE_ERROR: i32 = -32700;

/// Lines buffered between the reader thread and the request loop.
const LINE_BUFFER: usize = 64;

/// Written when a response cannot be encoded.
const ENCODE_FAILURE: &str =
    r#"{"id":null,"error":{"code":-32603,"message":"Failed to encode response"}}"#;

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Value,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct Response {
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ApiQueryError>,
}

/// Answer one request line.
pub fn handle_line(handler: &ApiGatewayHandler, line: &str) -> String {
    let response = match serde_json::from_str::<Request>(line) {
        Ok(request) => {
            debug!(method = %request.method, "Request");
            match handle_api_query(handler, &request.method, &request.params) {
                Ok(result) => Response {
                    id: request.id,
                    result: Some(result),
                    error: None,
                },
                Err(error) => {
                    warn!(method = %request.method, code = error.code, "{}", error.message);
                    Response {
                        id: request.id,
                        result: None,
                        error: Some(error),
                    }
                }
            }
        }
        Err(e) => Response {
            id: Value::Null,
            result: None,
            error: Some(ApiQueryError {
                code: PARSE_ERROR,
                message: format!("Parse error: {}", e),
            }),
        },
    };
    encode_line(&response)
}

fn encode_line<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        error!(error = %e, "Failed to encode response");
        ENCODE_FAILURE.to_string()
    })
}

/// Read lines from `reader` on a dedicated thread.
///
/// A read error is forwarded and ends the thread. It also stops at EOF
/// and when the receiver goes away.
pub fn spawn_line_reader<R>(reader: R) -> std::io::Result<mpsc::Receiver<std::io::Result<String>>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(LINE_BUFFER);
    std::thread::Builder::new()
        .name("request-reader".to_string())
        .spawn(move || {
            for line in reader.lines() {
                let failed = line.is_err();
                if tx.blocking_send(line).is_err() || failed {
                    break;
                }
            }
        })?;
    Ok(rx)
}

/// Serve requests from `lines` until the sender closes or shutdown.
pub async fn serve<W>(
    handler: Arc<ApiGatewayHandler>,
    mut lines: mpsc::Receiver<std::io::Result<String>>,
    mut writer: W,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut served = 0u64;

    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line.transpose()? else {
                    info!(served, "Request stream closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let mut response = handle_line(&handler, &line);
                response.push('\n');
                writer.write_all(response.as_bytes()).await?;
                writer.flush().await?;
                served += 1;
            }
            _ = shutdown.changed() => {
                info!(served, "Request loop shutting down");
                break;
            }
        }
    }
    Ok(served)
}
