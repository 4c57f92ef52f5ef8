// Tool session client tests - lifecycle against an in-memory MCP server
//
// Covers open/close ordering, scope cleanup on both exit paths, handshake
// failures and the at-most-once tool listing.

#[path = "../support/mod.rs"]
mod support;

use researcher_core::Error;
use researcher_core::schema::SchemaError;
use researcher_core::tooling::{NO_DESCRIPTION, ToolInvokeError, ToolSessionClient};
use serde_json::json;
use support::{
    Behaviour, MockTransport, SERVER_SAW_EOF, SharedLog, TRANSPORT_SHUTDOWN, ping_tool,
    website_firecrawl_tool, with_tools,
};

fn events(log: &SharedLog) -> Vec<&'static str> {
    log.lock().expect("log lock").events.clone()
}

fn methods(log: &SharedLog) -> Vec<String> {
    log.lock().expect("log lock").methods.clone()
}

fn count(log: &SharedLog, method: &str) -> usize {
    log.lock().expect("log lock").count(method)
}

#[tokio::test]
async fn opens_session_and_binds_every_tool() {
    let (transport, log) = MockTransport::new(with_tools(vec![
        website_firecrawl_tool(),
        ping_tool(),
    ]));

    let tools = ToolSessionClient::scope(transport, |client| async move {
        client.bound_tools().await
    })
    .await
    .expect("scope succeeds");

    assert_eq!(tools.len(), 2);
    assert_eq!(tools[0].name(), "website_firecrawl");
    assert_eq!(tools[0].description(), "Crawl a website");
    assert_eq!(tools[0].argument_type().len(), 3);
    assert_eq!(tools[1].name(), "ping");
    assert_eq!(tools[1].description(), NO_DESCRIPTION);
    assert!(tools[1].argument_type().is_empty());

    assert_eq!(
        methods(&log),
        ["initialize", "notifications/initialized", "tools/list"]
    );
}

#[tokio::test]
async fn tool_list_is_fetched_at_most_once() {
    let (transport, log) = MockTransport::new(with_tools(vec![website_firecrawl_tool()]));
    let client = ToolSessionClient::open(transport).await.expect("opens");

    let first = client.list_tools().await.expect("lists");
    let second = client.list_tools().await.expect("lists again");
    let bound = client.bound_tools().await.expect("binds");
    client.close().await.expect("closes");

    assert_eq!(first, second);
    assert_eq!(bound.len(), 1);
    assert_eq!(count(&log, "tools/list"), 1);
}

#[tokio::test]
async fn empty_tool_list_is_cached_too() {
    let (transport, log) = MockTransport::new(Behaviour::default());
    let client = ToolSessionClient::open(transport).await.expect("opens");

    assert!(client.list_tools().await.expect("lists").is_empty());
    assert!(client.bound_tools().await.expect("binds").is_empty());
    client.close().await.expect("closes");

    assert_eq!(count(&log, "tools/list"), 1);
}

#[tokio::test]
async fn scope_closes_session_then_transport_on_success() {
    let (transport, log) = MockTransport::new(with_tools(vec![ping_tool()]));

    let handle = ToolSessionClient::scope(transport, |client| async move {
        client.list_tools().await?;
        Ok::<_, ToolInvokeError>(client)
    })
    .await
    .expect("scope succeeds");

    assert!(handle.is_closed());
    assert_eq!(events(&log), [SERVER_SAW_EOF, TRANSPORT_SHUTDOWN]);
    assert!(!log.lock().expect("log lock").connected);
}

#[tokio::test]
async fn scope_closes_and_returns_body_error() {
    let (transport, log) = MockTransport::new(with_tools(vec![ping_tool()]));

    let result = ToolSessionClient::scope(transport, |client| async move {
        client
            .session()
            .call_tool("missing_tool", json!({}))
            .await
            .map_err(Error::from)
    })
    .await;

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        Error::Session(ToolInvokeError::Rpc { code: -32602, .. })
    ));
    assert_eq!(events(&log), [SERVER_SAW_EOF, TRANSPORT_SHUTDOWN]);
}

#[tokio::test]
async fn scope_closes_before_resuming_a_panicking_body() {
    let (transport, log) = MockTransport::new(with_tools(vec![ping_tool()]));

    let task = tokio::spawn(ToolSessionClient::scope(transport, |client| async move {
        let tools = client.list_tools().await?;
        assert!(tools.is_empty(), "body gives up on a non-empty tool list");
        Ok::<_, ToolInvokeError>(())
    }));

    let joined = task.await;
    assert!(joined.is_err_and(|err| err.is_panic()));
    assert_eq!(events(&log), [SERVER_SAW_EOF, TRANSPORT_SHUTDOWN]);
    assert!(!log.lock().expect("log lock").connected);
}

#[tokio::test]
async fn schema_errors_surface_from_binding_and_still_close() {
    let broken = json!({
        "name": "broken",
        "inputSchema": {"type": "object", "properties": {"nothing": {"type": "null"}}}
    });
    let (transport, log) = MockTransport::new(with_tools(vec![ping_tool(), broken]));

    let err = ToolSessionClient::scope(transport, |client| async move {
        client.bound_tools().await
    })
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        Error::Schema(SchemaError::UnsupportedKind { ref field, .. }) if field == "nothing"
    ));
    assert_eq!(events(&log), [SERVER_SAW_EOF, TRANSPORT_SHUTDOWN]);
}

#[tokio::test]
async fn handshake_error_releases_transport_without_listing() {
    let (transport, log) = MockTransport::new(Behaviour {
        fail_initialize: true,
        ..Behaviour::default()
    });

    let err = ToolSessionClient::open(transport)
        .await
        .err()
        .expect("open fails");

    assert!(matches!(err, ToolInvokeError::Rpc { ref server, .. } if server == "fake"));
    assert_eq!(methods(&log), ["initialize"]);
    assert_eq!(events(&log), [SERVER_SAW_EOF, TRANSPORT_SHUTDOWN]);
}

#[tokio::test]
async fn server_hanging_up_during_handshake_is_terminated() {
    let (transport, log) = MockTransport::new(Behaviour {
        hang_up_on_initialize: true,
        ..Behaviour::default()
    });

    let err = ToolSessionClient::open(transport)
        .await
        .err()
        .expect("open fails");

    assert!(matches!(err, ToolInvokeError::Terminated { .. }));
    assert_eq!(count(&log, "tools/list"), 0);
    assert_eq!(events(&log).last(), Some(&TRANSPORT_SHUTDOWN));
}

#[tokio::test]
async fn connect_failure_still_releases_transport() {
    let (transport, log) = MockTransport::new(Behaviour {
        refuse_connect: true,
        ..Behaviour::default()
    });

    let result = ToolSessionClient::scope(transport, |_client| async move {
        Ok::<_, ToolInvokeError>(())
    })
    .await;

    assert!(matches!(result, Err(ToolInvokeError::Transport { .. })));
    assert!(methods(&log).is_empty());
    assert_eq!(events(&log), [TRANSPORT_SHUTDOWN]);
}

#[tokio::test]
async fn close_is_idempotent() {
    let (transport, log) = MockTransport::new(with_tools(vec![ping_tool()]));
    let client = ToolSessionClient::open(transport).await.expect("opens");

    client.close().await.expect("first close");
    client.close().await.expect("second close");

    assert!(client.is_closed());
    let shutdowns = events(&log)
        .into_iter()
        .filter(|event| *event == TRANSPORT_SHUTDOWN)
        .count();
    assert_eq!(shutdowns, 1);
}

#[tokio::test]
async fn list_after_close_fails_with_closed() {
    let (transport, _log) = MockTransport::new(with_tools(vec![ping_tool()]));
    let client = ToolSessionClient::open(transport).await.expect("opens");
    client.close().await.expect("closes");

    let err = client.list_tools().await.unwrap_err();
    assert!(matches!(err, ToolInvokeError::Closed { .. }));
}

#[tokio::test]
async fn captures_server_instructions() {
    let (transport, _log) = MockTransport::new(Behaviour {
        instructions: Some("Use website_firecrawl for crawling.".to_string()),
        ..with_tools(vec![website_firecrawl_tool()])
    });

    let instructions = ToolSessionClient::scope(transport, |client| async move {
        Ok::<_, ToolInvokeError>(client.instructions().await)
    })
    .await
    .expect("scope succeeds");

    assert_eq!(
        instructions.as_deref(),
        Some("Use website_firecrawl for crawling.")
    );
}
