//! crates/prd_client_core/src/domain.rs
//!
//! Defines the pure, core data structures for the PRD Generator client.
//! These structs are independent of any transport, storage or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Returned when a string does not name a known variant of a domain enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

//=========================================================================================
// Users and Sessions
//=========================================================================================

/// The signed-in user as reported by `GET /users/me`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
}

impl UserProfile {
    /// The name shown in the navigation bar: the full name, or the email when unset.
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.email,
        }
    }
}

/// The persisted client session. `user` is only meaningful while `token` is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
}

impl Session {
    /// Both halves are present, so the UI may optimistically treat the user as signed in.
    pub fn is_complete(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }
}

/// Payload for `POST /auth/register`.
#[derive(Debug, Clone)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

/// Whatever identifying data the backend echoes back after registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisteredAccount {
    pub user_id: Option<String>,
    pub email: Option<String>,
}

//=========================================================================================
// Documents (PRDs)
//=========================================================================================

/// Category tag on a PRD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateType {
    CrudApplication,
    AiAgent,
    SaasPlatform,
    Custom,
}

impl TemplateType {
    pub const ALL: [TemplateType; 4] = [
        TemplateType::CrudApplication,
        TemplateType::AiAgent,
        TemplateType::SaasPlatform,
        TemplateType::Custom,
    ];

    /// The wire value used by the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateType::CrudApplication => "crud_application",
            TemplateType::AiAgent => "ai_agent",
            TemplateType::SaasPlatform => "saas_platform",
            TemplateType::Custom => "custom",
        }
    }

    /// Human readable badge text.
    pub fn label(&self) -> &'static str {
        match self {
            TemplateType::CrudApplication => "CRUD Application",
            TemplateType::AiAgent => "AI Agent",
            TemplateType::SaasPlatform => "SaaS Platform",
            TemplateType::Custom => "Custom Template",
        }
    }
}

impl FromStr for TemplateType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemplateType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("template type", s))
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format of a PRD's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Markdown,
    Json,
    Text,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Markdown => "markdown",
            Format::Json => "json",
            Format::Text => "text",
        }
    }

    /// File extension used on export, including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Markdown => ".md",
            Format::Json => ".json",
            Format::Text => ".txt",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Format::Markdown => "text/markdown",
            Format::Json => "application/json",
            Format::Text => "text/plain",
        }
    }
}

impl FromStr for Format {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markdown" => Ok(Format::Markdown),
            "json" => Ok(Format::Json),
            "text" => Ok(Format::Text),
            other => Err(UnknownVariant::new("format", other)),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated PRD. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub input_prompt: String,
    pub template_type: TemplateType,
    pub format: Format,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for `POST /prd/generate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub title: String,
    pub input_prompt: String,
    pub template_type: TemplateType,
    pub format: Format,
}

//=========================================================================================
// List Filtering and Pagination
//=========================================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Title,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::Title => "title",
        }
    }
}

impl FromStr for SortOrder {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "title" => Ok(SortOrder::Title),
            other => Err(UnknownVariant::new("sort order", other)),
        }
    }
}

/// Client-local list filters. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search: String,
    pub template: Option<TemplateType>,
    pub sort: SortOrder,
}

impl FilterState {
    /// True when search or template would drop documents from a page.
    pub fn is_narrowing(&self) -> bool {
        !self.search.is_empty() || self.template.is_some()
    }
}

/// Pagination cursor over the document list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: usize,
    pub items_per_page: usize,
    pub total_items: usize,
}

impl Pagination {
    pub fn new(items_per_page: usize) -> Self {
        Self {
            current_page: 1,
            items_per_page: items_per_page.max(1),
            total_items: 0,
        }
    }

    /// Offset of the first item on the current page. Saturates for absurd page numbers.
    pub fn skip(&self) -> usize {
        (self.current_page.max(1) - 1).saturating_mul(self.items_per_page)
    }

    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.items_per_page)
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }
}

//=========================================================================================
// Views and Routing
//=========================================================================================

/// The screens of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Home,
    Login,
    Register,
    Generate,
    History,
    Profile,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Home => "home",
            View::Login => "login",
            View::Register => "register",
            View::Generate => "generate",
            View::History => "history",
            View::Profile => "profile",
        }
    }

    /// Views that may only be entered with an authenticated session.
    pub fn requires_auth(&self) -> bool {
        matches!(self, View::Generate | View::History | View::Profile)
    }
}

impl FromStr for View {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(View::Home),
            "login" => Ok(View::Login),
            "register" => Ok(View::Register),
            "generate" => Ok(View::Generate),
            "history" => Ok(View::History),
            "profile" => Ok(View::Profile),
            other => Err(UnknownVariant::new("view", other)),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A navigation target, with the parameters the login view understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub view: View,
    /// Where login should send the user afterwards.
    pub redirect: Option<View>,
    /// Set when a registration succeeded but the automatic login did not.
    pub registered: bool,
}

impl Route {
    pub fn to(view: View) -> Self {
        Self {
            view,
            redirect: None,
            registered: false,
        }
    }

    pub fn login_returning_to(view: View) -> Self {
        Self {
            view: View::Login,
            redirect: Some(view),
            registered: false,
        }
    }

    pub fn login_after_registration() -> Self {
        Self {
            view: View::Login,
            redirect: None,
            registered: true,
        }
    }
}
