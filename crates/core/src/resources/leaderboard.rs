//! `/leaderboard` binding.

use crate::client::ApiClient;
use crate::error::ApiResult;
use medconnect_api_shared::LeaderEntry;

impl ApiClient {
    /// Top `limit` doctors by score. `None` when the payload is not a list.
    pub async fn leaderboard(&self, limit: u32) -> ApiResult<Option<Vec<LeaderEntry>>> {
        self.get_list("/leaderboard", &vec![("limit", limit.to_string())])
            .await
    }
}
