//! Stdio transport. Reads JSON-RPC from stdin, writes to stdout.
//!
//! The whole process is one implicit session whose credentials come from
//! configuration.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::auth::AuthContext;
use crate::protocol::ProtocolHandler;
use crate::types::{GatewayError, GatewayResult, RequestId};

use super::framing;

/// Stdio transport for desktop MCP clients.
pub struct StdioTransport {
    handler: ProtocolHandler,
    auth: AuthContext,
}

impl StdioTransport {
    pub fn new(handler: ProtocolHandler, auth: AuthContext) -> Self {
        Self { handler, auth }
    }

    /// Run the transport loop on the process's stdin and stdout.
    pub async fn run(&self) -> GatewayResult<()> {
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        self.serve(reader, writer).await
    }

    /// Serve newline-delimited messages until the reader reaches EOF.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> GatewayResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();

        tracing::info!("Stdio transport started");

        loop {
            buf.clear();
            let bytes_read = reader.read_until(b'\n', &mut buf).await?;

            if bytes_read == 0 {
                tracing::info!("EOF on stdin, shutting down");
                break;
            }

            let parsed = std::str::from_utf8(&buf)
                .map_err(|e| GatewayError::ParseError(e.to_string()))
                .and_then(|line| match line.trim() {
                    "" => Ok(None),
                    trimmed => framing::parse_message(trimmed).map(Some),
                });

            let reply = match parsed {
                Ok(None) => continue,
                Ok(Some(msg)) => self.handler.handle_message(msg, &self.auth).await,
                Err(e) => {
                    tracing::warn!("Parse error: {e}");
                    Some(serde_json::to_value(e.to_json_rpc_error(RequestId::Null))?)
                }
            };

            if let Some(value) = reply {
                let framed = framing::frame_message(&value)?;
                writer.write_all(framed.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::standard_registry;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_serves_lines_until_eof() {
        let registry = standard_registry(reqwest::Client::new(), None).unwrap();
        let transport = StdioTransport::new(
            ProtocolHandler::new(Arc::new(registry)),
            AuthContext::default(),
        );

        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            "{broken\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"say_hello","arguments":{"name":"Ada"}}}"#,
            "\n",
        );
        let mut output = Vec::new();
        transport.serve(input.as_bytes(), &mut output).await.unwrap();

        let lines: Vec<serde_json::Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["error"]["code"], -32700);
        assert_eq!(lines[2]["result"]["content"][0]["text"], "hello Ada");
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_end_the_session() {
        let registry = standard_registry(reqwest::Client::new(), None).unwrap();
        let transport = StdioTransport::new(
            ProtocolHandler::new(Arc::new(registry)),
            AuthContext::default(),
        );

        let mut input = b"\xff\xfe\n".to_vec();
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":9,"method":"ping"}"#);
        input.push(b'\n');

        let mut output = Vec::new();
        transport.serve(input.as_slice(), &mut output).await.unwrap();

        let lines: Vec<serde_json::Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["error"]["code"], -32700);
        assert_eq!(lines[0]["id"], serde_json::Value::Null);
        assert_eq!(lines[1]["id"], 9);
    }
}
