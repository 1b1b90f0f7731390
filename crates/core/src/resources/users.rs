//! `/users` bindings: own profile and the doctor directory.

use super::{push_repeated, push_text};
use crate::client::{ApiClient, Query, RequestBody};
use crate::error::ApiResult;
use medconnect_api_shared::{ProfileUpdate, UserRecord};
use reqwest::Method;

/// Doctor directory filters. Filtering happens on the server.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserFilters {
    pub search: Option<String>,
    pub hospitals: Vec<String>,
    pub specialties: Vec<String>,
}

impl UserFilters {
    pub fn to_query(&self) -> Query {
        let mut query = Query::new();
        push_text(&mut query, "search", self.search.as_deref());
        push_repeated(&mut query, "hospitals", &self.hospitals);
        push_repeated(&mut query, "specialties", &self.specialties);
        query
    }
}

impl ApiClient {
    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<UserRecord> {
        self.send(Method::PUT, "/users/me", RequestBody::json(update)?)
            .await
    }

    /// Directory listing. A non-array payload is treated as no results.
    pub async fn list_users(&self, filters: &UserFilters) -> ApiResult<Vec<UserRecord>> {
        Ok(self
            .get_list("/users", &filters.to_query())
            .await?
            .unwrap_or_default())
    }

    pub async fn get_user(&self, id: &str) -> ApiResult<UserRecord> {
        self.get(&format!("/users/{id}"), &Query::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_directory_filters() {
        let filters = UserFilters {
            search: Some("okafor".into()),
            hospitals: vec!["Korle Bu".into(), "Ridge".into()],
            specialties: vec!["Cardiology".into()],
        };
        assert_eq!(
            filters.to_query(),
            vec![
                ("search", "okafor".to_string()),
                ("hospitals", "Korle Bu".to_string()),
                ("hospitals", "Ridge".to_string()),
                ("specialties", "Cardiology".to_string()),
            ]
        );
    }
}
