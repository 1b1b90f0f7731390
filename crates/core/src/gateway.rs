//! The async seam between the case board and the network.
//!
//! [`ApiClient`] is the production implementation. Tests drive the board through a recording
//! fake so guards can be checked without a server.

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::resources::{AnswerDraft, CaseFilters};
use async_trait::async_trait;
use medconnect_api_shared::{AnswerRecord, CaseList, CaseRecord, CaseUpdate, LeaderEntry, NewCase};

#[async_trait]
pub trait CaseGateway: Send + Sync {
    async fn list_cases(&self, filters: &CaseFilters) -> ApiResult<CaseList>;
    async fn get_case(&self, id: &str) -> ApiResult<CaseRecord>;
    async fn create_case(&self, case: &NewCase) -> ApiResult<CaseRecord>;
    async fn update_case(&self, id: &str, update: &CaseUpdate) -> ApiResult<CaseRecord>;
    async fn close_case(&self, id: &str) -> ApiResult<()>;
    async fn vote_case(&self, id: &str) -> ApiResult<CaseRecord>;
    async fn vote_answer(&self, case_id: &str, answer_id: &str) -> ApiResult<CaseRecord>;
    async fn create_answer(&self, case_id: &str, draft: AnswerDraft) -> ApiResult<AnswerRecord>;
    async fn leaderboard(&self, limit: u32) -> ApiResult<Option<Vec<LeaderEntry>>>;
}

#[async_trait]
impl CaseGateway for ApiClient {
    async fn list_cases(&self, filters: &CaseFilters) -> ApiResult<CaseList> {
        ApiClient::list_cases(self, filters).await
    }

    async fn get_case(&self, id: &str) -> ApiResult<CaseRecord> {
        ApiClient::get_case(self, id).await
    }

    async fn create_case(&self, case: &NewCase) -> ApiResult<CaseRecord> {
        ApiClient::create_case(self, case).await
    }

    async fn update_case(&self, id: &str, update: &CaseUpdate) -> ApiResult<CaseRecord> {
        ApiClient::update_case(self, id, update).await
    }

    async fn close_case(&self, id: &str) -> ApiResult<()> {
        ApiClient::close_case(self, id).await
    }

    async fn vote_case(&self, id: &str) -> ApiResult<CaseRecord> {
        ApiClient::vote_case(self, id).await
    }

    async fn vote_answer(&self, case_id: &str, answer_id: &str) -> ApiResult<CaseRecord> {
        ApiClient::vote_answer(self, case_id, answer_id).await
    }

    async fn create_answer(&self, case_id: &str, draft: AnswerDraft) -> ApiResult<AnswerRecord> {
        ApiClient::create_answer(self, case_id, draft).await
    }

    async fn leaderboard(&self, limit: u32) -> ApiResult<Option<Vec<LeaderEntry>>> {
        ApiClient::leaderboard(self, limit).await
    }
}
