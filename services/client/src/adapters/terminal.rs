//! services/client/src/adapters/terminal.rs
//!
//! Terminal implementations of the UI ports: a line-oriented view for every
//! page, an OSC 52 clipboard and a file sink that writes into a directory.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Local;
use prd_client_core::domain::{Route, UserProfile};
use prd_client_core::ports::{
    AuthView, Clipboard, DocumentRow, DocumentView, FileSink, FormView, GenerateView, ListView,
    Navigator, PaginationControls, PortError, PortResult,
};
use tracing::{debug, info};

use crate::controllers::documents::format_timestamp;

const DEFAULT_COPY_LABEL: &str = "Copy";

//=========================================================================================
// Views
//=========================================================================================

/// One view object serves every page; the CLI only ever shows one at a time.
pub struct TerminalUi {
    assume_yes: bool,
    last_route: Mutex<Option<Route>>,
    copy_label: Mutex<String>,
}

impl TerminalUi {
    /// With `assume_yes`, confirmation prompts are accepted without reading stdin.
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            last_route: Mutex::new(None),
            copy_label: Mutex::new(DEFAULT_COPY_LABEL.to_string()),
        }
    }

    /// The most recent navigation, if any happened.
    pub fn last_route(&self) -> Option<Route> {
        self.last_route.lock().ok().and_then(|route| *route)
    }
}

impl AuthView for TerminalUi {
    fn show_authenticated(&self, user: &UserProfile) {
        info!("Signed in as {}", user.display_name());
    }

    fn show_unauthenticated(&self) {
        debug!("Not signed in");
    }
}

impl Navigator for TerminalUi {
    fn navigate(&self, route: Route) {
        match route.redirect {
            Some(back) => println!("-> {} (then back to {})", route.view, back),
            None => println!("-> {}", route.view),
        }
        if let Ok(mut last) = self.last_route.lock() {
            *last = Some(route);
        }
    }
}

impl FormView for TerminalUi {
    fn set_busy(&self, busy: bool) {
        if busy {
            eprintln!("Working...");
        }
    }

    fn show_error(&self, message: &str) {
        eprintln!("Error: {}", message);
    }

    fn hide_error(&self) {}

    fn show_notice(&self, message: &str) {
        println!("{}", message);
    }
}

impl GenerateView for TerminalUi {
    fn reveal_result(&self) {
        println!();
    }
}

impl ListView for TerminalUi {
    fn show_loading(&self) {
        debug!("Loading documents");
    }

    fn hide_loading(&self) {}

    fn render_rows(&self, rows: &[DocumentRow]) {
        for row in rows {
            println!(
                "{:<38} {:<40} {:<18} {:<9} {}",
                row.id,
                row.title,
                row.template_label,
                row.format_label.to_uppercase(),
                format_timestamp(row.created_at, &Local)
            );
        }
    }

    fn render_pagination(&self, controls: &PaginationControls) {
        if !controls.visible {
            return;
        }
        let pages: Vec<String> = controls
            .pages
            .iter()
            .map(|page| {
                if page.active {
                    format!("[{}]", page.number)
                } else {
                    page.number.to_string()
                }
            })
            .collect();
        println!(
            "{} {} {}",
            if controls.previous_disabled { " " } else { "<" },
            pages.join(" "),
            if controls.next_disabled { " " } else { ">" }
        );
    }

    fn set_empty_state(&self, visible: bool) {
        if visible {
            println!("No PRDs found.");
        }
    }

    fn show_error(&self, message: &str) {
        eprintln!("Error: {}", message);
    }

    fn hide_error(&self) {}

    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        print!("{} [y/N] ", message);
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }

    fn alert(&self, message: &str) {
        eprintln!("{}", message);
    }
}

impl DocumentView for TerminalUi {
    fn show_document(&self, title: &str, html: &str) {
        println!("{}\n{}\n", title, "=".repeat(title.chars().count()));
        println!("{}", html_to_text(html));
    }

    fn copy_label(&self) -> String {
        self.copy_label
            .lock()
            .map(|label| label.clone())
            .unwrap_or_else(|_| DEFAULT_COPY_LABEL.to_string())
    }

    fn set_copy_label(&self, label: &str) {
        if let Ok(mut current) = self.copy_label.lock() {
            *current = label.to_string();
        }
        if label != DEFAULT_COPY_LABEL {
            eprintln!("{}", label);
        }
    }
}

/// Strips tags and decodes the entities the renderer emits.
fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

//=========================================================================================
// Clipboard and Files
//=========================================================================================

/// Sets the system clipboard through the terminal with an OSC 52 sequence.
#[derive(Default)]
pub struct Osc52Clipboard;

#[async_trait]
impl Clipboard for Osc52Clipboard {
    async fn write_text(&self, text: &str) -> PortResult<()> {
        let sequence = format!("\x1b]52;c;{}\x07", STANDARD.encode(text));
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(sequence.as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| PortError::Unexpected(format!("Clipboard write failed: {}", e)))
    }
}

/// Saves exports into a directory, creating it when needed.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FileSink for DirectorySink {
    fn save(&self, filename: &str, mime_type: &str, bytes: &[u8]) -> PortResult<()> {
        let path = self.dir.join(filename);
        std::fs::create_dir_all(&self.dir)
            .and_then(|_| std::fs::write(&path, bytes))
            .map_err(|e| PortError::Storage(format!("{}: {}", path.display(), e)))?;
        info!("Saved {} ({}) to {}", filename, mime_type, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_is_flattened_for_the_terminal() {
        assert_eq!(
            html_to_text("<h1>Overview</h1>\n<pre><code>a &lt; b &amp;&amp; c</code></pre>"),
            "Overview\na < b && c"
        );
    }

    #[test]
    fn directory_sink_writes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("exports"));
        sink.save("My_PRD.md", "text/markdown", b"# Hi").unwrap();
        let written = std::fs::read_to_string(dir.path().join("exports/My_PRD.md")).unwrap();
        assert_eq!(written, "# Hi");
    }

    #[test]
    fn copy_label_round_trips() {
        let ui = TerminalUi::new(true);
        assert_eq!(ui.copy_label(), "Copy");
        ui.set_copy_label("Copied!");
        assert_eq!(ui.copy_label(), "Copied!");
        assert!(ui.confirm("Delete?"));
    }
}
