//! Line-delimited JSON-RPC over stdin/stdout

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::mcp::rpc::{json_rpc_error, PARSE_ERROR};
use crate::mcp::server::handle_json_rpc_payload;
use crate::AppState;

pub async fn serve_stdio(state: AppState) -> std::io::Result<()> {
    info!("serving mcp over stdio");
    serve_lines(&state, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

/// Processes one JSON-RPC payload per line until the reader hits EOF.
pub async fn serve_lines<R, W>(state: &AppState, mut reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let line = buf.trim_ascii();
        if line.is_empty() {
            continue;
        }

        // invalid UTF-8 surfaces here as a parse error
        let response = match serde_json::from_slice(line) {
            Ok(payload) => handle_json_rpc_payload(state, payload).await,
            Err(err) => {
                warn!(error = %err, "discarding unparseable line");
                Some(json_rpc_error(None, PARSE_ERROR, "Parse error"))
            }
        };

        if let Some(response) = response {
            let encoded = response.to_string();
            debug!(bytes = encoded.len(), "writing response");
            writer.write_all(encoded.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }

    info!("stdin closed, stopping stdio transport");
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::serve_lines;
    use crate::domain::profile::{build_registry, Profile};
    use crate::AppState;

    async fn run(input: &str) -> Vec<Value> {
        run_bytes(input.as_bytes()).await
    }

    async fn run_bytes(input: &[u8]) -> Vec<Value> {
        let state = AppState::new(None, build_registry(&Profile::secondary()).expect("registry"));
        let mut output = Vec::new();
        serve_lines(&state, input, &mut output)
            .await
            .expect("stdio loop completes");

        String::from_utf8(output)
            .expect("utf8 output")
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect()
    }

    #[tokio::test]
    async fn answers_requests_and_skips_notifications() {
        let responses = run(concat!(
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"even-or-odd","arguments":{"num":4}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"resources/read","params":{"uri":"greeting2://Alice"}}"#,
            "\n",
        ))
        .await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[0]["result"]["content"][0]["text"], "The result of 4 is even");
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(
            responses[1]["result"]["contents"][0]["text"],
            "Hello, Alice from the resource!"
        );
        assert_eq!(responses[1]["result"]["contents"][0]["uri"], "greeting2://Alice");
    }

    #[tokio::test]
    async fn invalid_json_yields_parse_error() {
        let responses = run("{not json\n").await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn invalid_utf8_line_does_not_stop_the_loop() {
        let mut input = br#"{"jsonrpc":"2.0","id":1,"method":"ping","x":""#.to_vec();
        input.extend_from_slice(b"\xff\xfe\"}\n");
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#);
        input.push(b'\n');

        let responses = run_bytes(&input).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert_eq!(responses[1]["id"], 2);
        assert!(responses[1]["result"].is_object());
    }

    #[tokio::test]
    async fn last_line_without_newline_is_answered() {
        let responses = run(r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#).await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], 7);
    }
}
