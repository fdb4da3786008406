// finbridge-mcp: MCP protocol types, the stdio tool server, the Yahoo
// Finance tools, and the Session client the bridge uses to talk to the
// server subprocess.

pub mod protocol;
pub mod server;
pub mod session;
pub mod tools;

pub use protocol::{
    CallToolParams, CallToolResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult, ToolContent, ToolSchema,
};
pub use server::McpServer;
pub use session::{Session, SessionConfig, SessionError, ToolHost};
