//! `/cases` bindings.

use super::{push_repeated, push_text};
use crate::client::{ApiClient, Query, RequestBody};
use crate::error::ApiResult;
use medconnect_api_shared::{CaseList, CasePage, CaseRecord, CaseUpdate, NewCase};
use medconnect_types::Urgency;
use reqwest::Method;

/// Server-side filters for the case listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CaseFilters {
    pub search: Option<String>,
    pub urgency: Option<Urgency>,
    pub tags: Vec<String>,
    pub open_only: bool,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl CaseFilters {
    /// Query pairs in the order the server documents them. `tags` repeats; `openOnly` is only
    /// sent when set.
    pub fn to_query(&self) -> Query {
        let mut query = Query::new();
        push_text(&mut query, "search", self.search.as_deref());
        if let Some(urgency) = self.urgency {
            query.push(("urgency", urgency.label().to_string()));
        }
        push_repeated(&mut query, "tags", &self.tags);
        if self.open_only {
            query.push(("openOnly", "true".to_string()));
        }
        if let Some(page) = self.page.filter(|p| *p > 0) {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            query.push(("limit", limit.to_string()));
        }
        query
    }
}

impl ApiClient {
    /// List cases. Both `{cases, totalPages, currentPage}` and bare arrays are accepted.
    pub async fn list_cases(&self, filters: &CaseFilters) -> ApiResult<CaseList> {
        let page: CasePage = self.get("/cases", &filters.to_query()).await?;
        Ok(page.into_list())
    }

    pub async fn get_case(&self, id: &str) -> ApiResult<CaseRecord> {
        self.get(&format!("/cases/{id}"), &Query::new()).await
    }

    pub async fn create_case(&self, case: &NewCase) -> ApiResult<CaseRecord> {
        self.send(Method::POST, "/cases", RequestBody::json(case)?)
            .await
    }

    pub async fn update_case(&self, id: &str, update: &CaseUpdate) -> ApiResult<CaseRecord> {
        self.send(Method::PUT, &format!("/cases/{id}"), RequestBody::json(update)?)
            .await
    }

    pub async fn delete_case(&self, id: &str) -> ApiResult<()> {
        self.send_unit(Method::DELETE, &format!("/cases/{id}"), RequestBody::Empty)
            .await
    }

    /// Upvote a case. The server answers with the entire updated case.
    pub async fn vote_case(&self, id: &str) -> ApiResult<CaseRecord> {
        self.send(Method::POST, &format!("/cases/{id}/vote"), RequestBody::Empty)
            .await
    }

    /// Close a case. The response payload is not used.
    pub async fn close_case(&self, id: &str) -> ApiResult<()> {
        self.send_unit(Method::PATCH, &format!("/cases/{id}/close"), RequestBody::Empty)
            .await
    }
}
