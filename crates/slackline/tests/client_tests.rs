//! End-to-end tests of the top-level client against a mock server.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use slackline::prelude::*;
use slackline::ClientSettings;
use tokio::runtime::Handle;
use wiremock::matchers::{body_string, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("slackline=debug,slackline_net=debug")
        .with_test_writer()
        .try_init();
}

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::builder(Handle::current())
        .base_url(format!("{}/api/{{api}}", server.uri()))
        .incoming_webhook_url(format!("{}/hook", server.uri()))
        .token("xoxb-test")
        .timeout(Duration::from_secs(5))
        .build()
        .expect("Failed to build config")
}

async fn mount_ok(server: &MockServer, api: &str, delay: Duration) {
    Mock::given(path(format!("/api/{api}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ok": true}))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_client_owns_every_group_and_sub_group() {
    let server = MockServer::start().await;
    let slack = SlackClient::new(config(&server)).expect("Failed to create client");

    let names: Vec<&str> = slack.resource_groups().iter().map(|g| g.name()).collect();
    assert_eq!(names.len(), 26);
    for name in [
        "im",
        "api",
        "team",
        "team.profile",
        "users.profile",
        "files.comments",
        "usergroups.users",
        "idpgroups",
    ] {
        assert!(names.contains(&name), "missing group {name}");
    }

    slack.close_all().await.expect("close");
}

#[tokio::test]
async fn test_endpoint_methods_format_calls() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat.postMessage"))
        .and(query_param("token", "xoxb-test"))
        .and(body_string("channel=C1&text=hello+world"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "ts": "1.0"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/api.test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let slack = SlackClient::new(config(&server)).expect("Failed to create client");
    let reply = slack
        .chat
        .post_message("C1", "hello world")
        .await
        .expect("post should succeed");
    assert_eq!(reply.get("ts"), Some(&json!("1.0")));

    slack.api.test(None).await.expect("api.test should succeed");
    let requests = server.received_requests().await.expect("recording enabled");
    let api_test = requests
        .iter()
        .find(|r| r.url.path() == "/api/api.test")
        .expect("api.test was called");
    assert!(api_test.url.query_pairs().all(|(k, _)| k != "error"));

    slack.close_all().await.expect("close");
}

#[tokio::test]
async fn test_open_and_connect_endpoints_dispatch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/im.open"))
        .and(body_string("user=U1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "channel": {"id": "D1"}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/mpim.open"))
        .and(body_string("users=U1%2CU2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "group": {"id": "G1"}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/rtm.connect"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "url": "wss://rtm"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let slack = SlackClient::new(config(&server)).expect("Failed to create client");
    let im = slack.im.open("U1").await.expect("im.open should succeed");
    assert_eq!(im.get("channel"), Some(&json!({"id": "D1"})));
    let mpim = slack
        .mpim
        .open(&["U1", "U2"])
        .await
        .expect("mpim.open should succeed");
    assert_eq!(mpim.get("group"), Some(&json!({"id": "G1"})));
    let rtm = slack.rtm.connect().await.expect("rtm.connect should succeed");
    assert_eq!(rtm.get("url"), Some(&json!("wss://rtm")));

    slack.close_all().await.expect("close");
}

#[tokio::test]
async fn test_optional_endpoint_arguments_are_omitted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/stars.add"))
        .and(body_string("file=F1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/stars.remove"))
        .and(body_string("channel=C1&timestamp=1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/channels.history"))
        .and(query_param("channel", "C1"))
        .and(query_param("count", "10"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "messages": []})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/usergroups.create"))
        .and(body_string("name=ops&description=on+call"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let slack = SlackClient::new(config(&server)).expect("Failed to create client");
    slack.stars.add(None, Some("F1"), None).await.expect("stars.add");
    slack
        .stars
        .remove(Some("C1"), None, Some("1.0"))
        .await
        .expect("stars.remove");
    slack
        .channels
        .history("C1", None, Some(10))
        .await
        .expect("channels.history");
    slack
        .usergroups
        .create("ops", None, Some("on call"))
        .await
        .expect("usergroups.create");

    let requests = server.received_requests().await.expect("recording enabled");
    let history = requests
        .iter()
        .find(|r| r.url.path() == "/api/channels.history")
        .expect("channels.history was called");
    assert!(history.url.query_pairs().all(|(k, _)| k != "latest"));

    slack.close_all().await.expect("close");
}

#[tokio::test]
async fn test_file_upload_through_client() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/files.upload"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "file": {"id": "F9"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(b"report body").expect("Failed to write temp file");

    let slack = SlackClient::new(config(&server)).expect("Failed to create client");
    slack
        .files
        .upload(
            FileSource::path(file.path()),
            UploadOptions {
                channels: vec!["C1".into(), "C2".into()],
                title: Some("x".into()),
                ..UploadOptions::default()
            },
        )
        .await
        .expect("upload should succeed");

    let requests = server.received_requests().await.expect("recording enabled");
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("report body"));
    assert!(body.contains("name=\"title\""));
    assert!(body.contains("C1,C2"));
    assert!(!body.contains("filetype"));
    assert!(!body.contains("initial_comment"));

    slack.close_all().await.expect("close");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_close_all_waits_for_every_group() {
    init_tracing();
    let server = MockServer::start().await;
    let delay = Duration::from_millis(150);
    mount_ok(&server, "team.info", delay).await;
    mount_ok(&server, "team.profile.get", delay).await;
    mount_ok(&server, "files.comments.add", delay).await;
    mount_ok(&server, "reactions.add", delay).await;
    Mock::given(path("/hook"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"accepted": true}))
                .set_delay(delay),
        )
        .mount(&server)
        .await;

    let slack = SlackClient::new(config(&server)).expect("Failed to create client");
    let handles = vec![
        slack.team.info(),
        slack.team.profile.fetch(None),
        slack.files.comments.add("F1", "nice"),
        slack.reactions.add("thumbsup", "C1", "1.0"),
    ];
    let hook = slack.incoming_webhook.post_json(&json!({"text": "hi"}));
    assert_eq!(slack.outstanding(), 5);
    assert_eq!(slack.team.outstanding(), 2);

    slack.close_all().await.expect("close should succeed");
    assert_eq!(slack.outstanding(), 0);
    assert!(slack.is_closed());
    assert!(slack.resource_groups().iter().all(|g| g.is_closed()));

    for handle in handles {
        handle.await.expect("drained call should have succeeded");
    }
    assert_eq!(hook.await.expect("webhook post"), json!({"accepted": true}));

    slack.close_all().await.expect("second close is a no-op");
    for group in slack.resource_groups() {
        assert_eq!(group.pool().release_count(), 1);
    }
}

#[tokio::test]
async fn test_close_all_collects_failures_from_all_groups() {
    let server = MockServer::start().await;
    Mock::given(path("/api/channels.join"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": false, "error": "is_archived"})),
        )
        .mount(&server)
        .await;
    Mock::given(path("/api/users.profile.set"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let slack = SlackClient::new(config(&server)).expect("Failed to create client");
    let _join = slack.channels.join("old");
    let _profile = slack.users.profile.set(None, "title", "dev");

    match slack.close_all().await {
        Err(Error::Drain { failures }) => {
            let mut kinds: Vec<ErrorKind> = failures.iter().map(|f| f.kind).collect();
            kinds.sort_by_key(|k| k.to_string());
            assert_eq!(kinds, vec![ErrorKind::Api, ErrorKind::HttpStatus]);
        }
        other => panic!("expected drain error, got {other:?}"),
    }
    assert_eq!(slack.outstanding(), 0);
}

#[tokio::test]
async fn test_calls_after_close_are_rejected() {
    let server = MockServer::start().await;
    let slack = SlackClient::new(config(&server)).expect("Failed to create client");
    slack.close_all().await.expect("close");

    let err = slack.auth.test().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Closed);
    let err = slack.incoming_webhook.post("{}").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Closed);
    assert!(server.received_requests().await.expect("recording enabled").is_empty());
}

#[tokio::test]
async fn test_scope_closes_client() {
    let server = MockServer::start().await;
    mount_ok(&server, "auth.test", Duration::from_millis(50)).await;

    let mut kept = None;
    let value = SlackClient::scope(config(&server), |slack| {
        kept = Some(Arc::clone(&slack));
        async move {
            // Left in flight on purpose; the scope drains it.
            let _pending = slack.auth.test();
            Ok(42)
        }
    })
    .await
    .expect("scope should succeed");

    assert_eq!(value, 42);
    let slack = kept.expect("client captured");
    assert!(slack.is_closed());
    assert_eq!(slack.outstanding(), 0);
}

#[tokio::test]
async fn test_scope_closes_client_when_body_fails() {
    let server = MockServer::start().await;

    let mut kept = None;
    let err = SlackClient::scope(config(&server), |slack| {
        kept = Some(Arc::clone(&slack));
        async move { Err::<(), _>(Error::Api("body_failed".into())) }
    })
    .await
    .unwrap_err();

    assert_eq!(err.api_error(), Some("body_failed"));
    assert!(kept.expect("client captured").is_closed());
}

#[tokio::test]
async fn test_client_from_settings_file() {
    let server = MockServer::start().await;
    mount_ok(&server, "emoji.list", Duration::ZERO).await;

    let mut settings = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    writeln!(
        settings,
        "token = \"xoxb-file\"\ntimeout_ms = 2000\nbase_url = \"{}/api/{{api}}\"",
        server.uri()
    )
    .expect("Failed to write settings");

    let loaded = ClientSettings::from_file(settings.path()).expect("settings parse");
    assert_eq!(loaded.token.as_deref(), Some("xoxb-file"));

    let slack = SlackClient::from_settings_file(settings.path(), Handle::current())
        .expect("Failed to create client");
    assert_eq!(slack.config().timeout(), Some(Duration::from_secs(2)));
    slack.emoji.list().await.expect("emoji.list should succeed");

    let requests = server.received_requests().await.expect("recording enabled");
    assert!(
        requests[0]
            .url
            .query_pairs()
            .any(|(k, v)| k == "token" && v == "xoxb-file")
    );
    slack.close_all().await.expect("close");
}

#[tokio::test]
async fn test_webhook_without_url_through_client() {
    let server = MockServer::start().await;
    let config = ClientConfig::builder(Handle::current())
        .base_url(format!("{}/api/{{api}}", server.uri()))
        .build()
        .expect("Failed to build config");
    let slack = SlackClient::new(config).expect("Failed to create client");

    let err = slack.incoming_webhook.post("{}").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert_eq!(slack.outstanding(), 0);
    assert!(server.received_requests().await.expect("recording enabled").is_empty());

    slack.close_all().await.expect("close");
}

#[tokio::test]
async fn test_generic_call_for_unlisted_method() {
    let server = MockServer::start().await;
    Mock::given(path("/api/conversations.list"))
        .and(query_param("types", "public_channel"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": true, "channels": []})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let slack = SlackClient::new(config(&server)).expect("Failed to create client");
    let envelope = slack
        .channels
        .call(ApiCall::get("conversations.list").param("types", "public_channel"))
        .await
        .expect("call should succeed");
    assert_eq!(envelope.get("channels"), Some(&json!([])));
    slack.close_all().await.expect("close");
}
