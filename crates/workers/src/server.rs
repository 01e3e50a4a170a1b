//! Line-delimited JSON-RPC server loop.
//!
//! Reads one request per line, answers one response per line, and stops
//! at end of input. Logging goes through `tracing`, never stdout, so the
//! response stream stays clean.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};
use wayfarer_core::rpc::{self, RpcRequest, RpcResponse};
use wayfarer_core::CapabilitySet;

/// Serve a capability set on stdin/stdout until stdin closes.
pub async fn serve_stdio(set: CapabilitySet) -> std::io::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve(&set, stdin, stdout).await
}

/// Serve a capability set over any line-oriented stream pair.
pub async fn serve<R, W>(set: &CapabilitySet, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!(worker = %set.server_name(), capabilities = set.len(), "Worker serving on stdio");
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<RpcRequest>(line) {
            Ok(request) => {
                debug!(method = %request.method, id = request.id, "Request received");
                set.handle(&request).await
            }
            Err(e) => {
                warn!(error = %e, "Unparseable request line");
                RpcResponse::failure(None, rpc::PARSE_ERROR, format!("Parse error: {e}"))
            }
        };

        let mut encoded = serde_json::to_string(&response)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        encoded.push('\n');
        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;
    }

    info!(worker = %set.server_name(), "Input closed, worker stopping");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_config::BuiltinWorker;

    async fn exchange(input: &str) -> Vec<RpcResponse> {
        let set = crate::builtin_worker(BuiltinWorker::Utility, "greeter");
        let mut output = Vec::new();
        serve(&set, input.as_bytes(), &mut output).await.unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn answers_each_line_in_order() {
        let input = format!(
            "{}\n{}\n",
            serde_json::to_string(&RpcRequest::list(1)).unwrap(),
            serde_json::to_string(&RpcRequest::call(2, "greet", serde_json::json!({"name": "Ada"})))
                .unwrap(),
        );
        let responses = exchange(&input).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].id, Some(1));
        assert!(responses[1].text().unwrap().starts_with("Hello, Ada!"));
    }

    #[tokio::test]
    async fn bad_lines_get_parse_errors() {
        let responses = exchange("not json\n\n").await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].id, None);
        assert_eq!(responses[0].error.as_ref().unwrap().code, rpc::PARSE_ERROR);
    }

    #[tokio::test]
    async fn unknown_method() {
        let req = RpcRequest::new(9, "resources/list", serde_json::json!({}));
        let responses = exchange(&format!("{}\n", serde_json::to_string(&req).unwrap())).await;
        assert_eq!(responses[0].error.as_ref().unwrap().code, rpc::METHOD_NOT_FOUND);
    }
}
