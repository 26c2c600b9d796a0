use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use mcp_tool_gateway::infra::boot::build_server;
use mcp_tool_gateway::infra::config::Config;
use mcp_tool_gateway::infra::transport::stdio::StdioTransport;
use mcp_tool_gateway::Transport;

#[tokio::test]
async fn stdio_round_trip_line_by_line() {
    let (mut client_in, server_in) = tokio::io::duplex(64 * 1024);
    let (server_out, client_out) = tokio::io::duplex(64 * 1024);

    let transport = StdioTransport::with_io(BufReader::new(server_in), server_out);
    transport.set_request_handler(build_server(&Config::default()).request_handler());
    transport.start().await.unwrap();

    let mut replies = BufReader::new(client_out).lines();

    client_in.write_all(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\"}\n").await.unwrap();
    let v: Value = serde_json::from_str(&replies.next_line().await.unwrap().unwrap()).unwrap();
    assert_eq!(v["id"], 1);
    assert_eq!(v["result"]["protocolVersion"], "2024-11-05");

    // Notification: nothing written, so the next line answers the request after it.
    client_in.write_all(b"{\"jsonrpc\":\"2.0\",\"method\":\"ping\"}\n").await.unwrap();
    client_in
        .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/call\",\"params\":{\"name\":\"echo\",\"arguments\":{\"message\":\"slan\"}}}\n")
        .await
        .unwrap();
    let v: Value = serde_json::from_str(&replies.next_line().await.unwrap().unwrap()).unwrap();
    assert_eq!(v["id"], 2);
    assert_eq!(v["result"]["content"][0]["text"], "slan");

    client_in.write_all(b"not json\n").await.unwrap();
    let v: Value = serde_json::from_str(&replies.next_line().await.unwrap().unwrap()).unwrap();
    assert_eq!(v["error"]["code"], -32700);

    drop(client_in);
    transport.wait().await.unwrap();
    assert!(!transport.is_running());
    assert!(replies.next_line().await.unwrap().is_none());
}
