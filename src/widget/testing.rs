use super::client::{AccountApi, ApiResponse};
use super::controls::ScoreControls;
use super::host::{HostEvent, HostNotifier};
use super::view::WidgetView;
use super::WidgetError;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

pub(crate) const TOKEN: &str = "2024-01-01T00:00:00Z";

struct Gate {
    entered: Notify,
    release: Notify,
}

/// In-memory proxy: serves one account and records every patch.
pub(crate) struct FakeApi {
    account: Mutex<Value>,
    get_status: u16,
    patch_status: u16,
    gets: AtomicUsize,
    patches: Mutex<Vec<(String, Value)>>,
    gate: Option<Gate>,
}

impl FakeApi {
    pub(crate) fn with_score(score: Value) -> Self {
        Self {
            account: Mutex::new(json!({
                "value": {
                    "id": "acc-1",
                    "extensions": { "CustomScore": score },
                    "adminData": { "updatedOn": TOKEN }
                }
            })),
            get_status: 200,
            patch_status: 200,
            gets: AtomicUsize::new(0),
            patches: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub(crate) fn get_status(mut self, status: u16) -> Self {
        self.get_status = status;
        self
    }

    pub(crate) fn patch_status(mut self, status: u16) -> Self {
        self.patch_status = status;
        self
    }

    pub(crate) fn without_token(self) -> Self {
        self.account.lock().unwrap()["value"]["adminData"] = json!({});
        self
    }

    pub(crate) fn restore_token(&self) {
        self.account.lock().unwrap()["value"]["adminData"] = json!({ "updatedOn": TOKEN });
    }

    /// Patches block until `release_patch` is called.
    pub(crate) fn gated(mut self) -> Self {
        self.gate = Some(Gate {
            entered: Notify::new(),
            release: Notify::new(),
        });
        self
    }

    pub(crate) async fn wait_for_patch(&self) {
        if let Some(gate) = &self.gate {
            gate.entered.notified().await;
        }
    }

    pub(crate) fn release_patch(&self) {
        if let Some(gate) = &self.gate {
            gate.release.notify_one();
        }
    }

    pub(crate) fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Recorded `(If-Match, body)` pairs.
    pub(crate) fn patches(&self) -> Vec<(String, Value)> {
        self.patches.lock().unwrap().clone()
    }
}

fn response(status: u16, body: String) -> ApiResponse {
    ApiResponse {
        status,
        reason: String::new(),
        body,
    }
}

#[async_trait]
impl AccountApi for FakeApi {
    async fn get_account(&self, _id: &str) -> Result<ApiResponse, WidgetError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.get_status != 200 {
            return Ok(response(self.get_status, r#"{"error":"upstream"}"#.into()));
        }
        let body = self.account.lock().unwrap().to_string();
        Ok(response(200, body))
    }

    async fn patch_account(
        &self,
        _id: &str,
        if_match: &str,
        patch: &Value,
    ) -> Result<ApiResponse, WidgetError> {
        self.patches
            .lock()
            .unwrap()
            .push((if_match.to_string(), patch.clone()));
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if self.patch_status != 200 {
            return Ok(response(self.patch_status, "rejected".into()));
        }
        let body = self.account.lock().unwrap().to_string();
        Ok(response(200, body))
    }
}

#[derive(Default)]
pub(crate) struct RecordingView {
    renders: Mutex<Vec<ScoreControls>>,
    loading: Mutex<Vec<bool>>,
    error: Mutex<Option<String>>,
}

impl RecordingView {
    pub(crate) fn last_render(&self) -> Option<ScoreControls> {
        self.renders.lock().unwrap().last().cloned()
    }

    pub(crate) fn loading_history(&self) -> Vec<bool> {
        self.loading.lock().unwrap().clone()
    }

    pub(crate) fn error(&self) -> Option<String> {
        self.error.lock().unwrap().clone()
    }
}

impl WidgetView for RecordingView {
    fn render(&self, controls: &ScoreControls) {
        self.renders.lock().unwrap().push(controls.clone());
    }

    fn set_loading(&self, visible: bool) {
        self.loading.lock().unwrap().push(visible);
    }

    fn show_error(&self, message: &str) {
        *self.error.lock().unwrap() = Some(message.to_string());
    }

    fn hide_error(&self) {
        *self.error.lock().unwrap() = None;
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    events: Mutex<Vec<HostEvent>>,
}

impl RecordingNotifier {
    pub(crate) fn events(&self) -> Vec<HostEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl HostNotifier for RecordingNotifier {
    fn notify(&self, event: HostEvent) {
        self.events.lock().unwrap().push(event);
    }
}
