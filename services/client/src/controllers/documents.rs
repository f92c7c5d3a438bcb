//! services/client/src/controllers/documents.rs
//!
//! The document list: fetch, search, template filter, sort, paginate, render.
//! The whole pipeline re-runs on every filter, sort or page change.

use std::cmp::Ordering;
use std::fmt::Display;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use feruca::Collator;
use prd_client_core::domain::{
    Document, FilterState, Pagination, SortOrder, TemplateType, View,
};
use prd_client_core::ports::{
    DocumentRow, ListView, PageLink, PaginationControls, PrdService,
};
use tracing::{debug, error, info, warn};

use super::auth::AuthController;
use crate::config::PagingMode;
use crate::error::{ClientError, ClientResult};

pub const DELETE_CONFIRMATION: &str =
    "Are you sure you want to delete this PRD? This action cannot be undone.";
pub const LOAD_ERROR: &str = "There was an error loading your PRDs. Please try again.";
pub const DELETE_ERROR: &str = "There was an error deleting the PRD. Please try again.";

/// Batch size when walking the full set; the backend's own default limit.
const FETCH_ALL_BATCH: usize = 100;

//=========================================================================================
// Pure Pipeline Steps
//=========================================================================================

/// Keeps documents whose title contains `search` (case-insensitive) and whose
/// template matches exactly, preserving order.
pub fn apply_filters(docs: Vec<Document>, filter: &FilterState) -> Vec<Document> {
    let needle = filter.search.to_lowercase();
    docs.into_iter()
        .filter(|doc| needle.is_empty() || doc.title.to_lowercase().contains(&needle))
        .filter(|doc| filter.template.map_or(true, |t| doc.template_type == t))
        .collect()
}

/// Stable sort: equal keys keep the server's order.
pub fn sort_documents(docs: &mut [Document], sort: SortOrder) {
    match sort {
        SortOrder::Newest => docs.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::Oldest => docs.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortOrder::Title => {
            let mut collator = Collator::default();
            docs.sort_by(|a, b| collator.collate(a.title.as_str(), b.title.as_str()))
        }
    }
}

/// Unicode collation (CLDR root order). Accents sort with their base letter and,
/// on a case-only difference, lowercase comes first.
pub fn collate(a: &str, b: &str) -> Ordering {
    Collator::default().collate(a, b)
}

pub fn run_pipeline(docs: Vec<Document>, filter: &FilterState) -> Vec<Document> {
    let mut survivors = apply_filters(docs, filter);
    sort_documents(&mut survivors, filter.sort);
    survivors
}

pub fn document_rows(docs: &[Document]) -> Vec<DocumentRow> {
    docs.iter()
        .map(|doc| DocumentRow {
            id: doc.id.clone(),
            title: doc.title.clone(),
            template_label: doc.template_type.label(),
            format_label: doc.format.as_str(),
            created_at: doc.created_at,
        })
        .collect()
}

pub fn pagination_controls(pagination: &Pagination) -> PaginationControls {
    let total_pages = pagination.total_pages();
    if total_pages <= 1 {
        return PaginationControls::default();
    }
    PaginationControls {
        visible: true,
        previous_disabled: pagination.current_page == 1,
        next_disabled: pagination.current_page >= total_pages,
        pages: (1..=total_pages)
            .map(|number| PageLink {
                number,
                active: number == pagination.current_page,
            })
            .collect(),
    }
}

/// Date plus hour:minute in the given zone.
pub fn format_timestamp<Tz>(at: DateTime<Utc>, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.with_timezone(zone).format("%Y-%m-%d %H:%M").to_string()
}

//=========================================================================================
// The Controller
//=========================================================================================

pub struct DocumentList {
    api: Arc<dyn PrdService>,
    auth: Arc<AuthController>,
    view: Arc<dyn ListView>,
    paging: PagingMode,
    filter: FilterState,
    pagination: Pagination,
    visible: Vec<Document>,
}

impl DocumentList {
    pub fn new(
        api: Arc<dyn PrdService>,
        auth: Arc<AuthController>,
        view: Arc<dyn ListView>,
        paging: PagingMode,
        items_per_page: usize,
    ) -> Self {
        Self {
            api,
            auth,
            view,
            paging,
            filter: FilterState::default(),
            pagination: Pagination::new(items_per_page),
            visible: Vec::new(),
        }
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    /// The rows currently rendered.
    pub fn documents(&self) -> &[Document] {
        &self.visible
    }

    pub fn find(&self, id: &str) -> Option<&Document> {
        self.visible.iter().find(|doc| doc.id == id)
    }

    // --- Filter changes: each resets to page 1 and reloads ---

    pub async fn set_search(&mut self, search: &str) -> ClientResult<()> {
        self.filter.search = search.trim().to_string();
        self.reset_and_load().await
    }

    pub async fn set_template(&mut self, template: Option<TemplateType>) -> ClientResult<()> {
        self.filter.template = template;
        self.reset_and_load().await
    }

    pub async fn set_sort(&mut self, sort: SortOrder) -> ClientResult<()> {
        self.filter.sort = sort;
        self.reset_and_load().await
    }

    /// Replaces every filter at once.
    pub async fn apply(&mut self, filter: FilterState) -> ClientResult<()> {
        self.filter = FilterState {
            search: filter.search.trim().to_string(),
            ..filter
        };
        self.reset_and_load().await
    }

    /// Sets the filters and the page together with a single load.
    pub async fn open(&mut self, filter: FilterState, page: usize) -> ClientResult<()> {
        self.filter = FilterState {
            search: filter.search.trim().to_string(),
            ..filter
        };
        self.go_to_page(page).await
    }

    async fn reset_and_load(&mut self) -> ClientResult<()> {
        self.pagination.current_page = 1;
        self.load().await
    }

    // --- Page changes ---

    pub async fn go_to_page(&mut self, page: usize) -> ClientResult<()> {
        self.pagination.current_page = page.max(1);
        self.load().await
    }

    /// No-op on the first page.
    pub async fn previous_page(&mut self) -> ClientResult<()> {
        if !self.pagination.has_previous() {
            return Ok(());
        }
        self.pagination.current_page -= 1;
        self.load().await
    }

    /// No-op on the last page.
    pub async fn next_page(&mut self) -> ClientResult<()> {
        if !self.pagination.has_next() {
            return Ok(());
        }
        self.pagination.current_page += 1;
        self.load().await
    }

    /// Runs the full pipeline and renders the result. A failed fetch shows a
    /// persistent error and never the empty-state message.
    pub async fn load(&mut self) -> ClientResult<()> {
        self.view.show_loading();
        self.view.hide_error();

        match self.fetch_visible().await {
            Ok((docs, total)) => {
                self.pagination.total_items = total;
                self.visible = docs;
                self.view.render_rows(&document_rows(&self.visible));
                self.view
                    .render_pagination(&pagination_controls(&self.pagination));
                self.view.hide_loading();
                self.view.set_empty_state(self.visible.is_empty());
                info!(
                    page = self.pagination.current_page,
                    shown = self.visible.len(),
                    "Document list loaded"
                );
                Ok(())
            }
            Err(e) => {
                error!("Error loading PRDs: {}", e);
                self.auth.intercept(&e, View::History).await;
                self.view.set_empty_state(false);
                self.view.show_error(LOAD_ERROR);
                self.view.hide_loading();
                Err(e)
            }
        }
    }

    async fn fetch_visible(&mut self) -> ClientResult<(Vec<Document>, usize)> {
        match self.paging {
            PagingMode::ServerPage => {
                let page = self
                    .api
                    .list_documents(self.pagination.skip(), self.pagination.items_per_page)
                    .await?;
                if self.filter.is_narrowing() {
                    warn!("Filters apply to the fetched page only; totals cover that page");
                }
                let survivors = run_pipeline(page, &self.filter);
                let total = survivors.len();
                Ok((survivors, total))
            }
            PagingMode::ClientSide => {
                let all = self.fetch_all().await?;
                let survivors = run_pipeline(all, &self.filter);
                let total = survivors.len();

                let per_page = self.pagination.items_per_page;
                let last_page = total.div_ceil(per_page).max(1);
                self.pagination.current_page = self.pagination.current_page.clamp(1, last_page);
                let start = self.pagination.skip();
                let page = survivors.into_iter().skip(start).take(per_page).collect();
                Ok((page, total))
            }
        }
    }

    async fn fetch_all(&self) -> ClientResult<Vec<Document>> {
        let mut all = Vec::new();
        loop {
            let batch = self.api.list_documents(all.len(), FETCH_ALL_BATCH).await?;
            let count = batch.len();
            all.extend(batch);
            if count < FETCH_ALL_BATCH {
                return Ok(all);
            }
        }
    }

    /// Deletes after confirmation, then reloads. Returns false when the user declined.
    pub async fn delete(&mut self, id: &str) -> ClientResult<bool> {
        if !self.view.confirm(DELETE_CONFIRMATION) {
            return Ok(false);
        }

        if let Err(e) = self.api.delete_document(id).await {
            let err = ClientError::from(e);
            error!("Error deleting PRD: {}", err);
            self.auth.intercept(&err, View::History).await;
            self.view.alert(DELETE_ERROR);
            return Err(err);
        }

        info!("Deleted PRD {}", id);
        if let Err(e) = self.load().await {
            debug!("Reload after delete failed: {}", e);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use prd_client_core::domain::Format;

    fn doc(id: &str, title: &str, template: TemplateType, minute: u32) -> Document {
        Document {
            id: id.into(),
            title: title.into(),
            input_prompt: String::new(),
            template_type: template,
            format: Format::Markdown,
            content: String::new(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, minute, 0).unwrap(),
        }
    }

    fn ids(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.id.as_str()).collect()
    }

    fn sample() -> Vec<Document> {
        vec![
            doc("1", "Todo app", TemplateType::CrudApplication, 1),
            doc("2", "Support Agent", TemplateType::AiAgent, 3),
            doc("3", "billing platform", TemplateType::SaasPlatform, 2),
            doc("4", "TODO tracker", TemplateType::CrudApplication, 3),
        ]
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let filter = FilterState {
            search: "todo".into(),
            ..Default::default()
        };
        assert_eq!(ids(&apply_filters(sample(), &filter)), ["1", "4"]);
    }

    #[test]
    fn absent_template_yields_nothing() {
        let filter = FilterState {
            template: Some(TemplateType::Custom),
            ..Default::default()
        };
        assert!(apply_filters(sample(), &filter).is_empty());
    }

    #[test]
    fn date_sorts_keep_server_order_on_ties() {
        let mut docs = sample();
        sort_documents(&mut docs, SortOrder::Newest);
        assert_eq!(ids(&docs), ["2", "4", "3", "1"]);

        sort_documents(&mut docs, SortOrder::Oldest);
        assert_eq!(ids(&docs), ["1", "3", "2", "4"]);
    }

    #[test]
    fn title_sort_is_stable_and_non_decreasing() {
        let mut docs = vec![
            doc("a", "beta", TemplateType::Custom, 0),
            doc("b", "Alpha", TemplateType::Custom, 0),
            doc("c", "beta", TemplateType::Custom, 0),
            doc("d", "alpha", TemplateType::Custom, 0),
            doc("e", "Beta", TemplateType::Custom, 0),
        ];
        sort_documents(&mut docs, SortOrder::Title);
        assert_eq!(ids(&docs), ["d", "b", "a", "c", "e"]);
        assert!(docs
            .windows(2)
            .all(|w| collate(&w[0].title, &w[1].title) != Ordering::Greater));
    }

    #[test]
    fn title_sort_places_accented_letters_with_their_base() {
        assert_eq!(collate("Éclair", "Zebra"), Ordering::Less);
        assert_eq!(collate("Ölplan", "Pilot"), Ordering::Less);
        assert_eq!(collate("alpha", "Alpha"), Ordering::Less);

        let mut docs = vec![
            doc("z", "Zebra", TemplateType::Custom, 0),
            doc("e", "Éclair", TemplateType::Custom, 0),
            doc("p", "Pilot", TemplateType::Custom, 0),
            doc("o", "Ölplan", TemplateType::Custom, 0),
            doc("d", "dessert", TemplateType::Custom, 0),
        ];
        sort_documents(&mut docs, SortOrder::Title);
        assert_eq!(ids(&docs), ["d", "e", "o", "p", "z"]);
    }

    #[test]
    fn pagination_controls_hide_for_single_page() {
        let mut pagination = Pagination::new(10);
        pagination.total_items = 10;
        assert!(!pagination_controls(&pagination).visible);

        pagination.total_items = 25;
        pagination.current_page = 1;
        let controls = pagination_controls(&pagination);
        assert!(controls.visible);
        assert!(controls.previous_disabled);
        assert!(!controls.next_disabled);
        assert_eq!(controls.pages.len(), 3);
        assert!(controls.pages[0].active);

        pagination.current_page = 3;
        let controls = pagination_controls(&pagination);
        assert!(!controls.previous_disabled);
        assert!(controls.next_disabled);
    }

    #[test]
    fn timestamps_format_in_the_given_zone() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 23, 45, 0).unwrap();
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(format_timestamp(at, &plus_two), "2024-05-02 01:45");
        assert_eq!(format_timestamp(at, &Utc), "2024-05-01 23:45");
    }
}
