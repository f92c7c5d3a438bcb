//! services/client/src/controllers/viewer.rs
//!
//! Renders a single document by format and exports it as a file or to the
//! clipboard.

use std::sync::Arc;
use std::time::Duration;

use prd_client_core::domain::{Document, Format};
use prd_client_core::ports::{Clipboard, DocumentView, FileSink};
use pulldown_cmark::{html, Options, Parser};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ClientError, ClientResult};

pub const COPIED_LABEL: &str = "Copied!";

/// A file ready to be handed to a `FileSink`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub filename: String,
    pub mime_type: &'static str,
    pub content: String,
}

//=========================================================================================
// Rendering
//=========================================================================================

/// Re-serializes JSON content with 2-space indentation, keeping key order.
pub fn pretty_json(content: &str) -> ClientResult<String> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| ClientError::Parse(e.to_string()))?;
    serde_json::to_string_pretty(&value).map_err(|e| ClientError::Parse(e.to_string()))
}

/// The text a document displays and exports as. JSON that fails to parse falls
/// back to the raw content.
pub fn display_text(doc: &Document) -> String {
    match doc.format {
        Format::Json => match pretty_json(&doc.content) {
            Ok(pretty) => pretty,
            Err(e) => {
                warn!("Document {} has malformed JSON content: {}", doc.id, e);
                doc.content.clone()
            }
        },
        Format::Markdown | Format::Text => doc.content.clone(),
    }
}

pub fn render_html(doc: &Document) -> String {
    match doc.format {
        Format::Markdown => markdown_to_html(&doc.content),
        Format::Json => format!("<pre><code>{}</code></pre>", escape_html(&display_text(doc))),
        Format::Text => format!("<pre>{}</pre>", escape_html(&doc.content)),
    }
}

fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

//=========================================================================================
// Export
//=========================================================================================

/// Each run of whitespace in the title becomes one underscore.
pub fn export_filename(title: &str, format: Format) -> String {
    let mut name = String::with_capacity(title.len() + 5);
    let mut in_whitespace = false;
    for c in title.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                name.push('_');
            }
            in_whitespace = true;
        } else {
            name.push(c);
            in_whitespace = false;
        }
    }
    name.push_str(format.extension());
    name
}

pub fn export(doc: &Document) -> Export {
    Export {
        filename: export_filename(&doc.title, doc.format),
        mime_type: doc.format.mime_type(),
        content: display_text(doc),
    }
}

//=========================================================================================
// The Viewer
//=========================================================================================

/// Holds the document currently on screen.
pub struct DocumentViewer {
    view: Arc<dyn DocumentView>,
    clipboard: Arc<dyn Clipboard>,
    files: Arc<dyn FileSink>,
    copy_feedback: Duration,
    current: Option<Document>,
}

impl DocumentViewer {
    pub fn new(
        view: Arc<dyn DocumentView>,
        clipboard: Arc<dyn Clipboard>,
        files: Arc<dyn FileSink>,
        copy_feedback: Duration,
    ) -> Self {
        Self {
            view,
            clipboard,
            files,
            copy_feedback,
            current: None,
        }
    }

    pub fn show(&mut self, doc: Document) {
        self.view.show_document(&doc.title, &render_html(&doc));
        self.current = Some(doc);
    }

    pub fn current(&self) -> Option<&Document> {
        self.current.as_ref()
    }

    /// Saves the current document through the file sink. `None` when nothing is shown.
    pub fn download(&self) -> ClientResult<Option<Export>> {
        let Some(doc) = &self.current else {
            return Ok(None);
        };
        let file = export(doc);
        self.files
            .save(&file.filename, file.mime_type, file.content.as_bytes())?;
        info!("Exported {}", file.filename);
        Ok(Some(file))
    }

    /// Copies the raw content and flashes "Copied!" on the copy control.
    /// Returns whether the clipboard accepted the text.
    pub async fn copy(&self) -> bool {
        let Some(doc) = &self.current else {
            return false;
        };
        if let Err(e) = self.clipboard.write_text(&doc.content).await {
            warn!("Failed to copy text: {}", e);
            return false;
        }
        let original = self.view.copy_label();
        self.view.set_copy_label(COPIED_LABEL);
        tokio::time::sleep(self.copy_feedback).await;
        self.view.set_copy_label(&original);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use prd_client_core::domain::TemplateType;

    fn doc(format: Format, content: &str) -> Document {
        Document {
            id: "d1".into(),
            title: "My  Todo\tApp".into(),
            input_prompt: String::new(),
            template_type: TemplateType::CrudApplication,
            format,
            content: content.into(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn filenames_collapse_whitespace() {
        assert_eq!(export_filename("My  Todo\tApp", Format::Markdown), "My_Todo_App.md");
        assert_eq!(export_filename(" lead", Format::Json), "_lead.json");
        assert_eq!(export_filename("plain", Format::Text), "plain.txt");
    }

    #[test]
    fn json_is_reindented_in_source_key_order() {
        let d = doc(Format::Json, r#"{"zeta":1,"alpha":{"b":[1,2]}}"#);
        assert_eq!(
            display_text(&d),
            "{\n  \"zeta\": 1,\n  \"alpha\": {\n    \"b\": [\n      1,\n      2\n    ]\n  }\n}"
        );
    }

    #[test]
    fn json_export_round_trips() {
        let content = r#"{"overview": "A <b>todo</b> app", "features": ["add", "remove"], "n": 3}"#;
        let d = doc(Format::Json, content);
        let file = export(&d);
        assert_eq!(file.filename, "My_Todo_App.json");
        assert_eq!(file.mime_type, "application/json");

        let exported: Value = serde_json::from_str(&file.content).unwrap();
        let original: Value = serde_json::from_str(content).unwrap();
        assert_eq!(exported, original);
    }

    #[test]
    fn malformed_json_falls_back_to_raw_text() {
        let d = doc(Format::Json, "{not json <x>");
        assert_eq!(display_text(&d), "{not json <x>");
        assert_eq!(render_html(&d), "<pre><code>{not json &lt;x&gt;</code></pre>");
        assert_eq!(export(&d).content, "{not json <x>");
    }

    #[test]
    fn markdown_and_text_rendering() {
        let md = render_html(&doc(Format::Markdown, "# Overview\n\nSome *text*."));
        assert!(md.contains("<h1>Overview</h1>"));
        assert!(md.contains("<em>text</em>"));

        let text = render_html(&doc(Format::Text, "a < b"));
        assert_eq!(text, "<pre>a &lt; b</pre>");
    }
}
