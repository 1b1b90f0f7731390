//! `/admin` bindings. The server rejects these for non-admin tokens.

use super::push_text;
use crate::client::{ApiClient, Query, RequestBody};
use crate::error::ApiResult;
use medconnect_api_shared::admin::{AdminAnswers, AdminMessages, AdminUsers, Broadcast};
use medconnect_api_shared::{ProfileUpdate, UserRecord};
use reqwest::Method;
use serde_json::{json, Value};

const ADMIN_PAGE_SIZE: u32 = 50;

/// Paging and search for the admin listings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminUserQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
}

impl Default for AdminUserQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: ADMIN_PAGE_SIZE,
            search: None,
        }
    }
}

impl AdminUserQuery {
    pub fn to_query(&self) -> Query {
        let mut query = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        push_text(&mut query, "search", self.search.as_deref());
        query
    }
}

impl ApiClient {
    pub async fn admin_edit_message(&self, message_id: &str, content: &str) -> ApiResult<Value> {
        self.send(
            Method::PUT,
            &format!("/admin/messages/{message_id}"),
            RequestBody::Json(json!({ "content": content })),
        )
        .await
    }

    pub async fn admin_set_message_visibility(
        &self,
        message_id: &str,
        hidden: bool,
    ) -> ApiResult<Value> {
        self.send(
            Method::PATCH,
            &format!("/admin/messages/{message_id}/visibility"),
            RequestBody::Json(json!({ "hidden": hidden })),
        )
        .await
    }

    pub async fn admin_delete_message(&self, message_id: &str) -> ApiResult<()> {
        self.send_unit(
            Method::DELETE,
            &format!("/admin/messages/{message_id}"),
            RequestBody::Empty,
        )
        .await
    }

    pub async fn admin_edit_answer(&self, answer_id: &str, content: &str) -> ApiResult<Value> {
        self.send(
            Method::PUT,
            &format!("/admin/answers/{answer_id}"),
            RequestBody::Json(json!({ "content": content })),
        )
        .await
    }

    pub async fn admin_set_answer_visibility(
        &self,
        answer_id: &str,
        hidden: bool,
    ) -> ApiResult<Value> {
        self.send(
            Method::PATCH,
            &format!("/admin/answers/{answer_id}/visibility"),
            RequestBody::Json(json!({ "hidden": hidden })),
        )
        .await
    }

    pub async fn admin_delete_answer(&self, answer_id: &str) -> ApiResult<()> {
        self.send_unit(
            Method::DELETE,
            &format!("/admin/answers/{answer_id}"),
            RequestBody::Empty,
        )
        .await
    }

    pub async fn admin_list_users(&self, query: &AdminUserQuery) -> ApiResult<AdminUsers> {
        self.get("/admin/users", &query.to_query()).await
    }

    pub async fn admin_reset_password(&self, user_id: &str, new_password: &str) -> ApiResult<()> {
        self.send_unit(
            Method::POST,
            &format!("/admin/users/{user_id}/reset-password"),
            RequestBody::Json(json!({ "newPassword": new_password })),
        )
        .await
    }

    pub async fn admin_delete_user(&self, user_id: &str) -> ApiResult<()> {
        self.send_unit(
            Method::DELETE,
            &format!("/admin/users/{user_id}"),
            RequestBody::Empty,
        )
        .await
    }

    pub async fn admin_update_user(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> ApiResult<UserRecord> {
        self.send(
            Method::PUT,
            &format!("/admin/users/{user_id}"),
            RequestBody::json(update)?,
        )
        .await
    }

    pub async fn admin_list_messages(&self, query: &AdminUserQuery) -> ApiResult<AdminMessages> {
        self.get("/admin/messages", &query.to_query()).await
    }

    pub async fn admin_list_answers(&self, query: &AdminUserQuery) -> ApiResult<AdminAnswers> {
        self.get("/admin/answers", &query.to_query()).await
    }

    /// Send a message to every user.
    pub async fn admin_broadcast(&self, broadcast: &Broadcast) -> ApiResult<Value> {
        self.send(Method::POST, "/admin/broadcast", RequestBody::json(broadcast)?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_query_defaults_to_first_page_of_fifty() {
        assert_eq!(
            AdminUserQuery::default().to_query(),
            vec![("page", "1".to_string()), ("limit", "50".to_string())]
        );
    }
}
