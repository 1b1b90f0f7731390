//! Feed Controller: the paged, filtered case list.
//!
//! States: idle, loading the first page, loading more, loaded, error.
//!
//! - Changing filters resets to page 1, clears the list and fetches again.
//! - `hasMore` follows `currentPage < totalPages` when the server sends paging metadata, and
//!   otherwise guesses from whether a full page came back.
//! - Loading the next page is refused while any load is in flight.
//! - Sorting for the trending and recent tabs is done locally over the held list.
//!
//! Fetches are split into [`FeedController::begin_first_page`] / [`FeedController::begin_next_page`]
//! and [`FeedController::complete`] so a caller that cannot hold the controller across an await
//! can still drive it. Responses for a superseded request are dropped.

use crate::authoring::normalize_tag_filter;
use crate::constants::FEED_PAGE_SIZE;
use crate::error::ApiResult;
use crate::gateway::CaseGateway;
use crate::resources::CaseFilters;
use crate::transform::{to_case_view, CaseView};
use chrono::{DateTime, Utc};
use medconnect_api_shared::CaseList;
use medconnect_types::Urgency;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedStatus {
    Idle,
    LoadingFirstPage,
    LoadingMore,
    Loaded,
    Error(String),
}

impl FeedStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, FeedStatus::LoadingFirstPage | FeedStatus::LoadingMore)
    }
}

/// Local ordering of the held list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FeedTab {
    /// Urgent first, then non-urgent, then case studies; newest first within each.
    #[default]
    Trending,
    /// Newest first.
    Recent,
}

/// Unlabelled cases sort after every known urgency.
fn trending_rank(urgency: Option<Urgency>) -> u8 {
    urgency.map_or(u8::MAX, Urgency::priority)
}

/// Filters the user controls. `urgency: None` means all urgencies.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeedFilters {
    pub search: String,
    pub urgency: Option<Urgency>,
    pub tags: Vec<String>,
    pub open_only: bool,
}

impl FeedFilters {
    /// Add a tag filter (trimmed, lowercased). Returns `false` for blanks and duplicates.
    pub fn add_tag(&mut self, raw: &str) -> bool {
        match normalize_tag_filter(raw) {
            Some(tag) if !self.tags.contains(&tag) => {
                self.tags.push(tag);
                true
            }
            _ => false,
        }
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    pub fn to_case_filters(&self, page: u32, limit: u32) -> CaseFilters {
        let search = self.search.trim();
        CaseFilters {
            search: (!search.is_empty()).then(|| search.to_string()),
            urgency: self.urgency,
            tags: self.tags.clone(),
            open_only: self.open_only,
            page: Some(page),
            limit: Some(limit),
        }
    }
}

/// A page fetch handed out by the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub append: bool,
    pub filters: CaseFilters,
    generation: u64,
}

pub struct FeedController {
    filters: FeedFilters,
    cases: Vec<CaseView>,
    status: FeedStatus,
    current_page: u32,
    total_pages: Option<u32>,
    has_more: bool,
    page_size: u32,
    generation: u64,
    clock: fn() -> DateTime<Utc>,
}

impl Default for FeedController {
    fn default() -> Self {
        Self::new(FEED_PAGE_SIZE)
    }
}

impl FeedController {
    pub fn new(page_size: u32) -> Self {
        Self {
            filters: FeedFilters::default(),
            cases: Vec::new(),
            status: FeedStatus::Idle,
            current_page: 1,
            total_pages: None,
            has_more: true,
            page_size,
            generation: 0,
            clock: Utc::now,
        }
    }

    /// Replace the time source used for relative labels.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub fn filters(&self) -> &FeedFilters {
        &self.filters
    }

    pub fn status(&self) -> &FeedStatus {
        &self.status
    }

    pub fn cases(&self) -> &[CaseView] {
        &self.cases
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Whether a sentinel becoming visible should load the next page.
    pub fn can_load_more(&self) -> bool {
        self.has_more && !self.status.is_loading()
    }

    /// Replace the filters. The list is cleared and paging restarts at page 1.
    pub fn begin_with_filters(&mut self, filters: FeedFilters) -> PageRequest {
        self.filters = filters;
        self.begin_first_page()
    }

    /// Restart at page 1 with the current filters.
    pub fn begin_first_page(&mut self) -> PageRequest {
        self.generation += 1;
        self.cases.clear();
        self.current_page = 1;
        self.total_pages = None;
        self.has_more = true;
        self.status = FeedStatus::LoadingFirstPage;
        PageRequest {
            page: 1,
            append: false,
            filters: self.filters.to_case_filters(1, self.page_size),
            generation: self.generation,
        }
    }

    /// Next page, or `None` if there is nothing more or a load is already in flight.
    pub fn begin_next_page(&mut self) -> Option<PageRequest> {
        if !self.can_load_more() {
            return None;
        }
        let page = self.current_page + 1;
        self.status = FeedStatus::LoadingMore;
        Some(PageRequest {
            page,
            append: true,
            filters: self.filters.to_case_filters(page, self.page_size),
            generation: self.generation,
        })
    }

    /// Apply the outcome of a fetch.
    ///
    /// A failed first page clears the list; a failed later page keeps what is held. Responses
    /// to a request that has since been superseded are ignored.
    pub fn complete(&mut self, request: &PageRequest, result: ApiResult<CaseList>) -> ApiResult<()> {
        if request.generation != self.generation {
            tracing::debug!(page = request.page, "dropping superseded feed response");
            return Ok(());
        }
        match result {
            Ok(list) => {
                self.apply(request, list);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(page = request.page, "failed to load cases: {err}");
                if !request.append {
                    self.cases.clear();
                    self.has_more = false;
                }
                self.status = FeedStatus::Error(err.to_string());
                Err(err)
            }
        }
    }

    fn apply(&mut self, request: &PageRequest, list: CaseList) {
        let now = self.now();
        let views: Vec<CaseView> = list.cases.iter().map(|c| to_case_view(c, now)).collect();
        let received = views.len();

        if request.append {
            self.cases.extend(views);
        } else {
            self.cases = views;
        }

        match list.total_pages {
            Some(total) => {
                self.total_pages = Some(total);
                self.current_page = list
                    .current_page
                    .filter(|p| *p > 0)
                    .unwrap_or(request.page);
                self.has_more = request.page < total;
            }
            None => {
                self.total_pages = None;
                self.current_page = request.page;
                self.has_more = received == self.page_size as usize;
            }
        }
        self.status = FeedStatus::Loaded;
    }

    /// Replace the filters and load page 1.
    pub async fn set_filters<G>(&mut self, gateway: &G, filters: FeedFilters) -> ApiResult<()>
    where
        G: CaseGateway + ?Sized,
    {
        let request = self.begin_with_filters(filters);
        let result = gateway.list_cases(&request.filters).await;
        self.complete(&request, result)
    }

    /// Load page 1 with the current filters.
    pub async fn refresh<G>(&mut self, gateway: &G) -> ApiResult<()>
    where
        G: CaseGateway + ?Sized,
    {
        let request = self.begin_first_page();
        let result = gateway.list_cases(&request.filters).await;
        self.complete(&request, result)
    }

    /// Load the next page. Returns `false` when the guard refused.
    pub async fn load_more<G>(&mut self, gateway: &G) -> ApiResult<bool>
    where
        G: CaseGateway + ?Sized,
    {
        let Some(request) = self.begin_next_page() else {
            return Ok(false);
        };
        let result = gateway.list_cases(&request.filters).await;
        self.complete(&request, result).map(|()| true)
    }

    /// The held list ordered for a tab. Sorting is stable.
    pub fn visible_cases(&self, tab: FeedTab) -> Vec<&CaseView> {
        let mut cases: Vec<&CaseView> = self.cases.iter().collect();
        match tab {
            FeedTab::Recent => {
                cases.sort_by(|a, b| b.created_at_millis().cmp(&a.created_at_millis()));
            }
            FeedTab::Trending => cases.sort_by(|a, b| {
                trending_rank(a.urgency)
                    .cmp(&trending_rank(b.urgency))
                    .then_with(|| b.created_at_millis().cmp(&a.created_at_millis()))
            }),
        }
        cases
    }

    /// Unique tags over the held list, in first-seen order.
    pub fn all_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for tag in self.cases.iter().flat_map(|c| c.tags.iter()) {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
        tags
    }

    pub fn find(&self, id: &str) -> Option<&CaseView> {
        self.cases.iter().find(|c| c.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut CaseView> {
        self.cases.iter_mut().find(|c| c.id == id)
    }

    /// Swap in a fresh copy of a held case, matched by id. Returns `false` if it is not held.
    pub fn replace(&mut self, view: CaseView) -> bool {
        match self.find_mut(&view.id) {
            Some(slot) => {
                *slot = view;
                true
            }
            None => false,
        }
    }

    pub fn prepend(&mut self, view: CaseView) {
        self.cases.insert(0, view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{case_record, fixed_now, FakeGateway};
    use crate::ApiError;

    fn controller() -> FeedController {
        FeedController::new(FEED_PAGE_SIZE).with_clock(fixed_now)
    }

    fn records(n: usize) -> Vec<medconnect_api_shared::CaseRecord> {
        (0..n)
            .map(|i| case_record(&format!("c-{i}"), Urgency::CaseStudy, "2025-03-01T00:00:00Z"))
            .collect()
    }

    #[tokio::test]
    async fn fallback_has_more_when_full_page() {
        let gateway = FakeGateway::default();
        gateway.push_page(CaseList {
            cases: records(20),
            total_pages: None,
            current_page: None,
        });
        let mut feed = controller();
        feed.refresh(&gateway).await.expect("should load");
        assert!(feed.has_more());
        assert_eq!(feed.current_page(), 1);

        gateway.push_page(CaseList {
            cases: records(19),
            total_pages: None,
            current_page: None,
        });
        feed.refresh(&gateway).await.expect("should load");
        assert!(!feed.has_more());
    }

    #[tokio::test]
    async fn paging_metadata_drives_has_more() {
        let gateway = FakeGateway::default();
        gateway.push_page(CaseList {
            cases: records(2),
            total_pages: Some(2),
            current_page: Some(1),
        });
        gateway.push_page(CaseList {
            cases: records(1),
            total_pages: Some(2),
            current_page: None,
        });

        let mut feed = controller();
        feed.refresh(&gateway).await.expect("page 1");
        assert!(feed.has_more());

        assert!(feed.load_more(&gateway).await.expect("page 2"));
        assert_eq!(feed.cases().len(), 3);
        assert_eq!(feed.current_page(), 2);
        assert!(!feed.has_more());

        assert!(!feed.load_more(&gateway).await.expect("guarded"));
        let requested: Vec<Option<u32>> =
            gateway.list_requests().iter().map(|f| f.page).collect();
        assert_eq!(requested, vec![Some(1), Some(2)]);
    }

    #[test]
    fn next_page_is_refused_while_loading() {
        let mut feed = controller();
        let first = feed.begin_first_page();
        assert_eq!(first.page, 1);
        assert!(feed.begin_next_page().is_none());

        feed.complete(
            &first,
            Ok(CaseList {
                cases: records(20),
                total_pages: None,
                current_page: None,
            }),
        )
        .expect("applies");
        let next = feed.begin_next_page().expect("should allow page 2");
        assert_eq!(next.page, 2);
        assert!(next.append);
        assert!(feed.begin_next_page().is_none());
    }

    #[test]
    fn superseded_response_is_dropped() {
        let mut feed = controller();
        let stale = feed.begin_first_page();
        let fresh = feed.begin_with_filters(FeedFilters {
            urgency: Some(Urgency::Urgent),
            ..FeedFilters::default()
        });
        feed.complete(
            &fresh,
            Ok(CaseList {
                cases: records(1),
                ..CaseList::default()
            }),
        )
        .expect("applies");
        feed.complete(
            &stale,
            Ok(CaseList {
                cases: records(5),
                ..CaseList::default()
            }),
        )
        .expect("ignored");
        assert_eq!(feed.cases().len(), 1);
    }

    #[test]
    fn first_page_error_clears_but_load_more_error_keeps() {
        let mut feed = controller();
        let first = feed.begin_first_page();
        feed.complete(
            &first,
            Ok(CaseList {
                cases: records(20),
                ..CaseList::default()
            }),
        )
        .expect("applies");

        let next = feed.begin_next_page().expect("page 2");
        let err = feed
            .complete(&next, Err(ApiError::InvalidInput("boom".into())))
            .expect_err("should surface");
        assert_eq!(err.to_string(), "boom");
        assert_eq!(feed.cases().len(), 20);
        assert_eq!(feed.status(), &FeedStatus::Error("boom".into()));
        assert!(feed.can_load_more());

        let first = feed.begin_first_page();
        let _ = feed.complete(&first, Err(ApiError::InvalidInput("down".into())));
        assert!(feed.cases().is_empty());
        assert!(!feed.can_load_more());
    }

    #[tokio::test]
    async fn filters_are_forwarded_to_the_server() {
        let gateway = FakeGateway::default();
        let mut filters = FeedFilters {
            search: "  fever ".into(),
            urgency: Some(Urgency::Urgent),
            open_only: true,
            ..FeedFilters::default()
        };
        assert!(filters.add_tag(" Malaria "));
        assert!(!filters.add_tag("malaria"));

        let mut feed = controller();
        feed.set_filters(&gateway, filters).await.expect("loads");
        let sent = gateway.list_requests().pop().expect("one request");
        assert_eq!(sent.search.as_deref(), Some("fever"));
        assert_eq!(sent.urgency, Some(Urgency::Urgent));
        assert_eq!(sent.tags, vec!["malaria"]);
        assert!(sent.open_only);
        assert_eq!(sent.limit, Some(20));
    }

    #[test]
    fn trending_and_recent_ordering() {
        let mut feed = controller();
        let request = feed.begin_first_page();
        feed.complete(
            &request,
            Ok(CaseList {
                cases: vec![
                    case_record("study-new", Urgency::CaseStudy, "2025-03-09T00:00:00Z"),
                    case_record("urgent-old", Urgency::Urgent, "2025-03-01T00:00:00Z"),
                    case_record("non-urgent", Urgency::NonUrgent, "2025-03-05T00:00:00Z"),
                    case_record("urgent-new", Urgency::Urgent, "2025-03-08T00:00:00Z"),
                    case_record("undated", Urgency::Urgent, ""),
                ],
                ..CaseList::default()
            }),
        )
        .expect("applies");

        let trending: Vec<&str> = feed
            .visible_cases(FeedTab::Trending)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(
            trending,
            vec!["urgent-new", "urgent-old", "undated", "non-urgent", "study-new"]
        );

        let recent: Vec<&str> = feed
            .visible_cases(FeedTab::Recent)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(
            recent,
            vec!["study-new", "urgent-new", "non-urgent", "urgent-old", "undated"]
        );
    }

    #[test]
    fn unlabelled_cases_trend_last_without_blanking_the_feed() {
        let mut feed = controller();
        let mut legacy = case_record("legacy", Urgency::Urgent, "2025-03-09T00:00:00Z");
        legacy.urgency = None;
        let request = feed.begin_first_page();
        feed.complete(
            &request,
            Ok(CaseList {
                cases: vec![
                    legacy,
                    case_record("study", Urgency::CaseStudy, "2025-03-01T00:00:00Z"),
                ],
                ..CaseList::default()
            }),
        )
        .expect("applies");

        let trending: Vec<&str> = feed
            .visible_cases(FeedTab::Trending)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(trending, vec!["study", "legacy"]);
    }

    #[test]
    fn all_tags_are_unique_in_first_seen_order() {
        let mut feed = controller();
        let mut a = case_record("a", Urgency::Urgent, "2025-03-01T00:00:00Z");
        a.tags = vec!["icu".into(), "sepsis".into()];
        let mut b = case_record("b", Urgency::Urgent, "2025-03-01T00:00:00Z");
        b.tags = vec!["sepsis".into(), "peds".into()];
        let request = feed.begin_first_page();
        feed.complete(
            &request,
            Ok(CaseList {
                cases: vec![a, b],
                ..CaseList::default()
            }),
        )
        .expect("applies");
        assert_eq!(feed.all_tags(), vec!["icu", "sepsis", "peds"]);
    }
}
