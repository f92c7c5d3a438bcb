//! crates/prd_client_core/src/ports.rs
//!
//! Defines the service contracts (traits) the client controllers depend on.
//! These traits form the boundary of the hexagonal architecture: the backend,
//! the durable key/value store and every piece of UI are injected through them,
//! so the controllers never reach for global state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Document, GenerationRequest, RegisteredAccount, Registration, Route, UserProfile,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// The backend answered with a non-2xx status.
    #[error("Request failed with status {status}: {message}")]
    Api { status: u16, message: String },
    /// No response was received at all.
    #[error("Network error: {0}")]
    Network(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    pub fn status(&self) -> Option<u16> {
        match self {
            PortError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Infrastructure Ports
//=========================================================================================

/// Durable string key/value storage scoped to one client installation.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> PortResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> PortResult<()>;
    fn remove(&self, key: &str) -> PortResult<()>;
}

/// The REST surface of the PRD Generator backend.
#[async_trait]
pub trait PrdService: Send + Sync {
    /// Exchanges credentials for a bearer token.
    async fn login(&self, email: &str, password: &str) -> PortResult<String>;

    async fn register(&self, registration: &Registration) -> PortResult<RegisteredAccount>;

    /// Fetches the current profile. An explicit `bearer` overrides the stored token.
    async fn fetch_profile(&self, bearer: Option<&str>) -> PortResult<UserProfile>;

    async fn generate(&self, request: &GenerationRequest) -> PortResult<Document>;

    async fn list_documents(&self, skip: usize, limit: usize) -> PortResult<Vec<Document>>;

    async fn get_document(&self, id: &str) -> PortResult<Document>;

    async fn delete_document(&self, id: &str) -> PortResult<()>;
}

//=========================================================================================
// UI Ports
//=========================================================================================

/// Navigation bar state that depends on authentication.
pub trait AuthView: Send + Sync {
    fn show_authenticated(&self, user: &UserProfile);
    fn show_unauthenticated(&self);
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// A submit-style form (login, registration, generation).
pub trait FormView: Send + Sync {
    fn set_busy(&self, busy: bool);
    fn show_error(&self, message: &str);
    fn hide_error(&self);
    /// A non-error banner, such as the post-registration hint on the login form.
    fn show_notice(&self, message: &str);
}

pub trait GenerateView: FormView {
    /// Reveals the result area and scrolls it into view.
    fn reveal_result(&self);
}

/// One row of the document table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRow {
    pub id: String,
    pub title: String,
    pub template_label: &'static str,
    pub format_label: &'static str,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLink {
    pub number: usize,
    pub active: bool,
}

/// Page-number controls. `visible` is false when there is at most one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationControls {
    pub visible: bool,
    pub previous_disabled: bool,
    pub next_disabled: bool,
    pub pages: Vec<PageLink>,
}

pub trait ListView: Send + Sync {
    fn show_loading(&self);
    fn hide_loading(&self);
    fn render_rows(&self, rows: &[DocumentRow]);
    fn render_pagination(&self, controls: &PaginationControls);
    fn set_empty_state(&self, visible: bool);
    fn show_error(&self, message: &str);
    fn hide_error(&self);
    /// Blocking yes/no question. Returning false cancels the action.
    fn confirm(&self, message: &str) -> bool;
    /// Blocking notification.
    fn alert(&self, message: &str);
}

/// Displays a single document.
pub trait DocumentView: Send + Sync {
    fn show_document(&self, title: &str, html: &str);
    fn copy_label(&self) -> String;
    fn set_copy_label(&self, label: &str);
}

#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> PortResult<()>;
}

/// Receives downloaded files.
pub trait FileSink: Send + Sync {
    fn save(&self, filename: &str, mime_type: &str, bytes: &[u8]) -> PortResult<()>;
}
