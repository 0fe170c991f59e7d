use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use httpmock::MockServer;
use serde_json::json;
use tokio::sync::Notify;

use nagare_client::{
    AlertGate, AlertKind, AlertSink, ApiClient, ClientConfig, Navigator, TokenStore,
};

/// Navigator that records navigation intents instead of moving a router.
pub struct RecordingNavigator {
    current: Mutex<String>,
    pub visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new(current: &str) -> Self {
        Self {
            current: Mutex::new(current.to_string()),
            visited: Mutex::new(Vec::new()),
        }
    }

    pub fn current(&self) -> String {
        self.current.lock().unwrap().clone()
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.current()
    }

    fn go(&self, path: String) {
        let mut current = self.current.lock().unwrap();
        // Navigating to the route already being shown is a no-op.
        if *current == path {
            return;
        }
        *current = path.clone();
        self.visited.lock().unwrap().push(path);
    }
}

/// Alert sink that counts invocations. In `held` mode each alert blocks
/// until the test releases it, keeping the failure episode open.
pub struct CountingAlert {
    shown: AtomicUsize,
    pub kinds: Mutex<Vec<AlertKind>>,
    held: bool,
    release: Notify,
}

impl CountingAlert {
    pub fn immediate() -> Self {
        Self::build(false)
    }

    pub fn held() -> Self {
        Self::build(true)
    }

    fn build(held: bool) -> Self {
        Self {
            shown: AtomicUsize::new(0),
            kinds: Mutex::new(Vec::new()),
            held,
            release: Notify::new(),
        }
    }

    pub fn count(&self) -> usize {
        self.shown.load(Ordering::SeqCst)
    }

    pub fn release_one(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl AlertSink for CountingAlert {
    async fn show(&self, kind: AlertKind) {
        self.kinds.lock().unwrap().push(kind);
        self.shown.fetch_add(1, Ordering::SeqCst);
        if self.held {
            self.release.notified().await;
        }
    }
}

/// A mock backend plus a fully wired client with recording collaborators.
pub struct TestHarness {
    pub server: MockServer,
    pub client: Arc<ApiClient>,
    pub session: Arc<TokenStore>,
    pub gate: Arc<AlertGate>,
    pub alerts: Arc<CountingAlert>,
    pub navigator: Arc<RecordingNavigator>,
}

pub async fn harness() -> TestHarness {
    harness_with(Arc::new(CountingAlert::immediate())).await
}

pub async fn harness_with(alerts: Arc<CountingAlert>) -> TestHarness {
    let server = MockServer::start_async().await;
    let session = Arc::new(TokenStore::in_memory());
    let gate = Arc::new(AlertGate::new(Box::new(alerts.clone())));
    let navigator = Arc::new(RecordingNavigator::new("/dashboard"));
    let config = ClientConfig {
        base_url: server.base_url(),
        timeout_secs: 5,
        config_dir: None,
    };
    let client = Arc::new(
        ApiClient::new(&config, session.clone(), gate.clone(), navigator.clone())
            .expect("client builds"),
    );
    TestHarness {
        server,
        client,
        session,
        gate,
        alerts,
        navigator,
    }
}

/// A structurally valid three-segment token with the given privilege claim.
pub fn token_with_privileges(privileges: i64) -> String {
    let payload = json!({
        "uid": 1,
        "username": "tester",
        "privileges": privileges,
        "exp": 4_000_000_000_i64,
    });
    format!(
        "header.{}.signature",
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}
