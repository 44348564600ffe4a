//! mailbridge MCP gateway: mail, calendar and web tools for MCP clients over
//! event-stream, session-HTTP and stdio transports.

pub mod auth;
pub mod config;
pub mod login;
pub mod protocol;
pub mod server;
pub mod session;
pub mod tools;
pub mod transport;
pub mod types;

pub use auth::AuthContext;
pub use protocol::ProtocolHandler;
pub use server::{router, GatewayServer, GatewayState};
pub use session::SessionStore;
pub use tools::{standard_registry, ToolRegistry};
pub use transport::StdioTransport;
