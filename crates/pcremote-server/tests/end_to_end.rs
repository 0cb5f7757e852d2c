use std::sync::{Arc, Mutex};
use std::time::Duration;

use pcremote_api::ApiClient;
use pcremote_core::types::ExecuteResult;
use pcremote_core::{AppError, ClientConfig};
use pcremote_server::{app_router, AppState};
use pcremote_sync::{run_agent, Notice, PendingActionSync, PendingList, PendingView};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

async fn spawn_server(state: AppState) -> (String, tokio::task::JoinHandle<()>) {
    let app = app_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });
    (format!("http://{}", addr), handle)
}

fn client_for(base: &str) -> ApiClient {
    ApiClient::new(ClientConfig::new(base, "opaque-token").expect("config")).expect("client")
}

#[derive(Default)]
struct RecordingView {
    renders: Mutex<Vec<PendingList>>,
    notices: Mutex<Vec<Notice>>,
}

impl PendingView for RecordingView {
    fn render(&self, list: &PendingList) {
        self.renders.lock().unwrap().push(list.clone());
    }

    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

#[tokio::test]
async fn raised_hook_is_listed_decided_and_reported() {
    let (base, handle) = spawn_server(AppState::default()).await;
    let client = Arc::new(client_for(&base));

    assert!(client.list_pending().await.unwrap().is_empty());

    let first = client.submit_hook("shell", "rm -rf /tmp/x").await.unwrap();
    let second = client.submit_hook("edit", "patch main.rs").await.unwrap();

    let view = Arc::new(RecordingView::default());
    let sync = PendingActionSync::new(client.clone(), view.clone());
    sync.sync_once().await;

    let listed: Vec<String> = sync.snapshot().into_iter().map(|a| a.id).collect();
    assert_eq!(listed, vec![first.clone(), second.clone()]);

    sync.decide(&first, false).await.expect("decide");
    let remaining: Vec<String> = sync.snapshot().into_iter().map(|a| a.id).collect();
    assert_eq!(remaining, vec![second.clone()]);
    assert_eq!(
        view.notices.lock().unwrap().clone(),
        vec![Notice::success("Denied")]
    );

    let result = client.hook_result(&first).await.unwrap();
    assert!(result.ready);
    assert_eq!(result.approved, Some(false));

    let open = client.hook_result(&second).await.unwrap();
    assert!(!open.ready);

    handle.abort();
}

#[tokio::test]
async fn hook_submitter_sees_decision_made_elsewhere() {
    let (base, handle) = spawn_server(AppState::default()).await;
    let client = Arc::new(client_for(&base));
    let hook_id = client.submit_hook("shell", "cargo publish").await.unwrap();

    let waiter = {
        let client = client.clone();
        let hook_id = hook_id.clone();
        tokio::spawn(async move {
            client
                .wait_for_decision(&hook_id, Duration::from_millis(20), Duration::from_secs(5))
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    client.decide(&hook_id, true).await.unwrap();

    assert!(waiter.await.unwrap().expect("decision"));
    assert!(client.list_pending().await.unwrap().is_empty());

    handle.abort();
}

#[tokio::test]
async fn hook_defaults_apply_to_missing_fields() {
    let (base, handle) = spawn_server(AppState::default()).await;
    let http = reqwest::Client::new();

    let created: Value = http
        .post(format!("{base}/api/claude/hook"))
        .json(&json!({}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(created["ok"], json!(true));

    let pending = client_for(&base).list_pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].tool, "?");
    assert_eq!(pending[0].description, "");

    handle.abort();
}

#[tokio::test]
async fn unknown_decision_and_result_are_harmless() {
    let (base, handle) = spawn_server(AppState::default()).await;
    let client = client_for(&base);

    client.decide("nope", true).await.expect("accepted silently");
    let result = client.hook_result("nope").await.unwrap();
    assert!(!result.ready);
    assert_eq!(result.approved, None);

    handle.abort();
}

#[tokio::test]
async fn execute_is_relayed_to_agent() {
    let (base, handle) = spawn_server(AppState::default()).await;
    let client = Arc::new(client_for(&base));

    let request = {
        let client = client.clone();
        tokio::spawn(async move { client.execute("git_status").await })
    };

    // Play the PC agent: pick the command up and answer it.
    let http = reqwest::Client::new();
    let command = loop {
        let polled: Value = http
            .get(format!("{base}/api/poll"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if let Some(cmd) = polled["commands"].as_array().and_then(|c| c.first()).cloned() {
            break cmd;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    };
    assert_eq!(command["key"], json!("git_status"));

    let id = command["id"].as_str().unwrap();
    http.post(format!("{base}/api/result/{id}"))
        .json(&json!({"ok": true, "output": "On branch main"}))
        .send()
        .await
        .unwrap();

    let result = request.await.unwrap().expect("execute");
    assert_eq!(
        result,
        ExecuteResult {
            ok: true,
            output: "On branch main".into()
        }
    );

    handle.abort();
}

#[tokio::test]
async fn unknown_command_is_rejected_with_detail() {
    let (base, handle) = spawn_server(AppState::default()).await;

    let err = client_for(&base).execute("format_c").await.unwrap_err();
    match err {
        AppError::Api { status, detail } => {
            assert_eq!(status, 400);
            assert_eq!(detail, "Unknown command");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    handle.abort();
}

#[tokio::test]
async fn silent_agent_times_out() {
    let state = AppState::default().with_waits(Duration::from_millis(50), Duration::from_millis(50));
    let (base, handle) = spawn_server(state).await;
    let client = client_for(&base);

    let result = client.execute("system_info").await.unwrap();
    assert!(!result.ok);
    assert!(result.output.contains("Timed out"));

    let status = client.status().await.unwrap();
    assert!(!status.ok);

    let sent = client.send_text("hello").await.unwrap();
    assert!(!sent.ok);

    handle.abort();
}

#[tokio::test]
async fn empty_send_is_rejected() {
    let (base, handle) = spawn_server(AppState::default()).await;

    let err = client_for(&base).send_text("   ").await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), "Text is empty");

    handle.abort();
}

#[tokio::test]
async fn catalog_is_listed() {
    let (base, handle) = spawn_server(AppState::default()).await;

    let commands = client_for(&base).list_commands().await.unwrap();
    assert!(commands.iter().any(|c| c.key == "system_info"));
    assert_eq!(commands.len(), 5);

    handle.abort();
}

#[tokio::test]
async fn agent_answers_relayed_commands() {
    let (base, handle) = spawn_server(AppState::default()).await;
    let client = Arc::new(client_for(&base));

    let token = CancellationToken::new();
    let agent = tokio::spawn(run_agent(
        Arc::new(client_for(&base)),
        Duration::from_millis(20),
        token.clone(),
    ));

    let status = client.status().await.unwrap();
    assert!(status.ok, "status should come from the agent: {}", status.info);
    assert!(status.info.lines().any(|l| l.starts_with("CPU: ")));
    assert!(status.info.lines().all(|l| l.contains(": ")));

    let result = client.execute("git_status").await.unwrap();
    assert_eq!(
        result,
        ExecuteResult {
            ok: false,
            output: "Unknown command: git_status".into()
        }
    );

    token.cancel();
    agent.await.expect("agent loop exits on cancel");
    handle.abort();
}
