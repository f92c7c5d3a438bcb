//! Shared fixtures for the integration tests: a mock backend, an in-memory
//! session and a UI that records everything it is asked to show.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use prd_client_core::domain::{Route, UserProfile};
use prd_client_core::ports::{
    AuthView, Clipboard, DocumentRow, DocumentView, FileSink, FormView, GenerateView, ListView,
    Navigator, PaginationControls, PortError, PortResult, PrdService,
};
use prdgen_lib::adapters::{HttpGateway, MemoryStore};
use prdgen_lib::config::AuthMode;
use prdgen_lib::controllers::AuthController;
use prdgen_lib::session::SessionStore;
use serde_json::{json, Value};
use url::Url;

//=========================================================================================
// Recording UI
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Authenticated(String),
    Unauthenticated,
    Navigated(Route),
    Busy(bool),
    Error(String),
    ErrorHidden,
    Notice(String),
    Revealed,
    Loading(bool),
    Rows(Vec<String>),
    Pagination(PaginationControls),
    EmptyState(bool),
    Alert(String),
    Confirm(String),
    Document { title: String, html: String },
    CopyLabel(String),
}

pub struct RecordingUi {
    events: Mutex<Vec<UiEvent>>,
    confirm_answer: bool,
    copy_label: Mutex<String>,
}

impl RecordingUi {
    pub fn new(confirm_answer: bool) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            confirm_answer,
            copy_label: Mutex::new("Copy".to_string()),
        }
    }

    fn push(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn last_route(&self) -> Option<Route> {
        self.events().into_iter().rev().find_map(|e| match e {
            UiEvent::Navigated(route) => Some(route),
            _ => None,
        })
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn last_rows(&self) -> Option<Vec<String>> {
        self.events().into_iter().rev().find_map(|e| match e {
            UiEvent::Rows(rows) => Some(rows),
            _ => None,
        })
    }

    pub fn last_pagination(&self) -> Option<PaginationControls> {
        self.events().into_iter().rev().find_map(|e| match e {
            UiEvent::Pagination(controls) => Some(controls),
            _ => None,
        })
    }
}

impl AuthView for RecordingUi {
    fn show_authenticated(&self, user: &UserProfile) {
        self.push(UiEvent::Authenticated(user.email.clone()));
    }
    fn show_unauthenticated(&self) {
        self.push(UiEvent::Unauthenticated);
    }
}

impl Navigator for RecordingUi {
    fn navigate(&self, route: Route) {
        self.push(UiEvent::Navigated(route));
    }
}

impl FormView for RecordingUi {
    fn set_busy(&self, busy: bool) {
        self.push(UiEvent::Busy(busy));
    }
    fn show_error(&self, message: &str) {
        self.push(UiEvent::Error(message.to_string()));
    }
    fn hide_error(&self) {
        self.push(UiEvent::ErrorHidden);
    }
    fn show_notice(&self, message: &str) {
        self.push(UiEvent::Notice(message.to_string()));
    }
}

impl GenerateView for RecordingUi {
    fn reveal_result(&self) {
        self.push(UiEvent::Revealed);
    }
}

impl ListView for RecordingUi {
    fn show_loading(&self) {
        self.push(UiEvent::Loading(true));
    }
    fn hide_loading(&self) {
        self.push(UiEvent::Loading(false));
    }
    fn render_rows(&self, rows: &[DocumentRow]) {
        self.push(UiEvent::Rows(rows.iter().map(|r| r.id.clone()).collect()));
    }
    fn render_pagination(&self, controls: &PaginationControls) {
        self.push(UiEvent::Pagination(controls.clone()));
    }
    fn set_empty_state(&self, visible: bool) {
        self.push(UiEvent::EmptyState(visible));
    }
    fn show_error(&self, message: &str) {
        self.push(UiEvent::Error(message.to_string()));
    }
    fn hide_error(&self) {
        self.push(UiEvent::ErrorHidden);
    }
    fn confirm(&self, message: &str) -> bool {
        self.push(UiEvent::Confirm(message.to_string()));
        self.confirm_answer
    }
    fn alert(&self, message: &str) {
        self.push(UiEvent::Alert(message.to_string()));
    }
}

impl DocumentView for RecordingUi {
    fn show_document(&self, title: &str, html: &str) {
        self.push(UiEvent::Document {
            title: title.to_string(),
            html: html.to_string(),
        });
    }
    fn copy_label(&self) -> String {
        self.copy_label.lock().unwrap().clone()
    }
    fn set_copy_label(&self, label: &str) {
        *self.copy_label.lock().unwrap() = label.to_string();
        self.push(UiEvent::CopyLabel(label.to_string()));
    }
}

//=========================================================================================
// Clipboard and File Fakes
//=========================================================================================

#[derive(Default)]
pub struct FakeClipboard {
    pub fail: bool,
    pub written: Mutex<Vec<String>>,
}

#[async_trait]
impl Clipboard for FakeClipboard {
    async fn write_text(&self, text: &str) -> PortResult<()> {
        if self.fail {
            return Err(PortError::Unexpected("clipboard unavailable".into()));
        }
        self.written.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeSink {
    pub saved: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl FileSink for FakeSink {
    fn save(&self, filename: &str, mime_type: &str, bytes: &[u8]) -> PortResult<()> {
        self.saved
            .lock()
            .unwrap()
            .push((filename.to_string(), mime_type.to_string(), bytes.to_vec()));
        Ok(())
    }
}

//=========================================================================================
// Harness
//=========================================================================================

pub struct Harness {
    pub server: mockito::ServerGuard,
    pub store: Arc<MemoryStore>,
    pub session: SessionStore,
    pub api: Arc<dyn PrdService>,
    pub ui: Arc<RecordingUi>,
    pub auth: Arc<AuthController>,
}

impl Harness {
    pub async fn new(mode: AuthMode, confirm_answer: bool) -> Self {
        let server = mockito::Server::new_async().await;
        let store = Arc::new(MemoryStore::default());
        let session = SessionStore::new(store.clone(), mode);
        let base = Url::parse(&format!("{}/api/v1", server.url())).unwrap();
        let api: Arc<dyn PrdService> = Arc::new(HttpGateway::new(base, session.clone()).unwrap());
        let ui = Arc::new(RecordingUi::new(confirm_answer));
        let auth = Arc::new(AuthController::new(
            api.clone(),
            session.clone(),
            ui.clone(),
            ui.clone(),
        ));
        Self {
            server,
            store,
            session,
            api,
            ui,
            auth,
        }
    }

    pub async fn enforced() -> Self {
        Self::new(AuthMode::Enforced, true).await
    }

    /// Stores a session as a previous login would have.
    pub fn sign_in(&self, token: &str) {
        self.session.commit(token, &profile()).unwrap();
    }
}

//=========================================================================================
// Payloads
//=========================================================================================

pub fn profile() -> UserProfile {
    UserProfile {
        id: "7".into(),
        email: "ada@example.com".into(),
        full_name: Some("Ada Lovelace".into()),
        is_active: true,
    }
}

pub fn profile_json() -> String {
    json!({
        "id": 7,
        "email": "ada@example.com",
        "full_name": "Ada Lovelace",
        "is_active": true
    })
    .to_string()
}

pub fn token_json(token: &str) -> String {
    json!({ "access_token": token, "token_type": "bearer" }).to_string()
}

/// A document created `minutes` after a fixed epoch.
pub fn doc_json(id: &str, title: &str, template: &str, format: &str, minutes: i64) -> Value {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes);
    json!({
        "id": id,
        "title": title,
        "input_prompt": format!("Prompt for {}", title),
        "template_type": template,
        "format": format,
        "content": format!("# {}", title),
        "created_at": created.to_rfc3339(),
    })
}

pub fn body(docs: &[Value]) -> String {
    Value::Array(docs.to_vec()).to_string()
}
