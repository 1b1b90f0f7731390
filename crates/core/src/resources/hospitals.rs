//! `/hospitals` bindings.

use super::push_text;
use crate::client::{ApiClient, Query, RequestBody};
use crate::error::ApiResult;
use medconnect_api_shared::Hospital;
use medconnect_types::HospitalLevel;
use reqwest::Method;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HospitalFilters {
    pub search: Option<String>,
    pub level: Option<HospitalLevel>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

impl HospitalFilters {
    pub fn to_query(&self) -> Query {
        let mut query = Query::new();
        push_text(&mut query, "search", self.search.as_deref());
        if let Some(level) = self.level {
            query.push(("level", level.as_str().to_string()));
        }
        push_text(&mut query, "city", self.city.as_deref());
        push_text(&mut query, "region", self.region.as_deref());
        push_text(&mut query, "country", self.country.as_deref());
        query
    }
}

impl ApiClient {
    pub async fn list_hospitals(&self, filters: &HospitalFilters) -> ApiResult<Vec<Hospital>> {
        Ok(self
            .get_list("/hospitals", &filters.to_query())
            .await?
            .unwrap_or_default())
    }

    pub async fn get_hospital(&self, id: &str) -> ApiResult<Hospital> {
        self.get(&format!("/hospitals/{id}"), &Query::new()).await
    }

    pub async fn create_hospital(&self, hospital: &Hospital) -> ApiResult<Hospital> {
        self.send(Method::POST, "/hospitals", RequestBody::json(hospital)?)
            .await
    }

    pub async fn update_hospital(&self, id: &str, hospital: &Hospital) -> ApiResult<Hospital> {
        self.send(
            Method::PUT,
            &format!("/hospitals/{id}"),
            RequestBody::json(hospital)?,
        )
        .await
    }

    pub async fn delete_hospital(&self, id: &str) -> ApiResult<()> {
        self.send_unit(Method::DELETE, &format!("/hospitals/{id}"), RequestBody::Empty)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_uses_lowercase_wire_name() {
        let filters = HospitalFilters {
            level: Some(HospitalLevel::Tertiary),
            city: Some("Accra".into()),
            ..HospitalFilters::default()
        };
        assert_eq!(
            filters.to_query(),
            vec![
                ("level", "tertiary".to_string()),
                ("city", "Accra".to_string()),
            ]
        );
    }
}
