// Stdio client for the tool host subprocess.
//
// The bridge holds exactly one Session for its lifetime. All calls go
// through an async mutex over the child's stdin/stdout pair, so
// concurrent HTTP requests serialize onto the single ordered pipe.

use crate::protocol::{
    methods, JsonRpcRequest, JsonRpcResponse, ListToolsResult, ToolSchema, PROTOCOL_VERSION,
};
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// How to launch the tool host subprocess
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Working directory for the child
    pub dir: PathBuf,
    pub command: String,
    pub args: Vec<String>,
    /// Upper bound on any single call, including initialize
    pub call_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            command: "finbridge-mcp".to_string(),
            args: Vec::new(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to spawn tool host: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("tool host I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("tool host channel closed")]
    Closed,

    #[error("tool host call timed out")]
    Timeout,

    #[error("tool host wire error: {0}")]
    Json(#[from] serde_json::Error),

    /// The host answered with a JSON-RPC error object
    #[error("tool host error {code}: {message}")]
    Rpc { code: i32, message: String },
}

impl SessionError {
    /// Whether the host rejected the named tool/method itself
    pub fn is_method_not_found(&self) -> bool {
        matches!(
            self,
            Self::Rpc { code, .. } if *code == crate::protocol::JsonRpcError::METHOD_NOT_FOUND
        )
    }
}

/// Capability contract the bridge programs against. `Session` is the
/// production implementation; tests substitute a fake.
#[async_trait::async_trait]
pub trait ToolHost: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolSchema>, SessionError>;
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, SessionError>;
}

struct Pipe {
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
    next_id: u64,
}

/// One long-lived handle to a tool host subprocess
pub struct Session {
    pipe: Mutex<Pipe>,
    call_timeout: Duration,
    // Held so the child is killed when the session drops
    _child: Child,
}

impl Session {
    /// Launch the subprocess and complete the initialize handshake.
    /// Returns only once the host is ready to take calls.
    pub async fn spawn(config: SessionConfig) -> Result<Self, SessionError> {
        tracing::info!(
            "spawning tool host: {} {:?} (cwd {})",
            config.command,
            config.args,
            config.dir.display()
        );

        let mut child = Command::new(&config.command)
            .args(&config.args)
            .current_dir(&config.dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            // host logs pass through on stderr
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(SessionError::Spawn)?;

        let stdin = child.stdin.take().ok_or(SessionError::Closed)?;
        let stdout = child.stdout.take().ok_or(SessionError::Closed)?;

        let session = Self {
            pipe: Mutex::new(Pipe {
                stdin,
                lines: BufReader::new(stdout).lines(),
                next_id: 0,
            }),
            call_timeout: config.call_timeout,
            _child: child,
        };

        session.initialize().await?;
        Ok(session)
    }

    async fn initialize(&self) -> Result<(), SessionError> {
        self.request(
            methods::INITIALIZE,
            Some(serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {
                    "name": "finbridge",
                    "version": env!("CARGO_PKG_VERSION"),
                },
            })),
        )
        .await?;

        let note = JsonRpcRequest::notification(methods::INITIALIZED);
        let mut pipe = self.pipe.lock().await;
        write_line(&mut pipe.stdin, &note).await?;
        Ok(())
    }

    /// Send one request and read lines until the matching response
    /// arrives. Host-emitted notifications and stray lines are skipped.
    async fn request(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, SessionError> {
        let call = async {
            let mut pipe = self.pipe.lock().await;
            pipe.next_id += 1;
            let id = pipe.next_id;

            let request = JsonRpcRequest::new(id, method, params);
            write_line(&mut pipe.stdin, &request).await?;

            loop {
                let line = pipe
                    .lines
                    .next_line()
                    .await?
                    .ok_or(SessionError::Closed)?;
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                let Ok(response) = serde_json::from_str::<JsonRpcResponse>(trimmed) else {
                    tracing::debug!("skipping non-response line from host");
                    continue;
                };
                if !is_reply_to(&response, id) {
                    continue;
                }

                if let Some(error) = response.error {
                    return Err(SessionError::Rpc {
                        code: error.code,
                        message: error.message,
                    });
                }
                return match response.result {
                    Some(result) => Ok(result),
                    // a reply with neither result nor error breaks the
                    // protocol; treat it as a dead channel
                    None => Err(SessionError::Closed),
                };
            }
        };

        tokio::time::timeout(self.call_timeout, call)
            .await
            .map_err(|_| SessionError::Timeout)?
    }
}

#[async_trait::async_trait]
impl ToolHost for Session {
    async fn list_tools(&self) -> Result<Vec<ToolSchema>, SessionError> {
        let result = self.request(methods::LIST_TOOLS, None).await?;
        let listed: ListToolsResult = serde_json::from_value(result)?;
        Ok(listed.tools)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, SessionError> {
        self.request(
            methods::CALL_TOOL,
            Some(serde_json::json!({
                "name": name,
                "arguments": arguments,
            })),
        )
        .await
    }
}

async fn write_line(stdin: &mut ChildStdin, request: &JsonRpcRequest) -> Result<(), SessionError> {
    let mut wire = serde_json::to_string(request)?;
    wire.push('\n');
    stdin.write_all(wire.as_bytes()).await?;
    stdin.flush().await?;
    Ok(())
}

fn is_reply_to(response: &JsonRpcResponse, id: u64) -> bool {
    (response.result.is_some() || response.error.is_some())
        && response.id.as_u64() == Some(id)
}
