pub mod resources;
pub mod validation;

use serde::Deserialize;

use crate::config::ApiConfig;
use crate::database::PageRequest;

/// `?page=&per_page=` on list endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListQuery {
    pub fn page_request(&self, api: &ApiConfig) -> PageRequest {
        let per_page = self
            .per_page
            .unwrap_or(api.default_per_page)
            .clamp(1, api.max_per_page.max(1));
        PageRequest::new(self.page.unwrap_or(1), per_page)
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in partial updates. Use with `#[serde(default)]`.
pub mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::PropertyChanges;
    use serde_json::json;

    fn api_config() -> ApiConfig {
        ApiConfig {
            port: 0,
            default_per_page: 15,
            max_per_page: 100,
            enable_request_logging: false,
        }
    }

    #[test]
    fn list_query_defaults_and_caps() {
        let api = api_config();
        assert_eq!(ListQuery::default().page_request(&api), PageRequest::new(1, 15));

        let query = ListQuery {
            page: Some(3),
            per_page: Some(1000),
        };
        assert_eq!(query.page_request(&api), PageRequest::new(3, 100));

        let query = ListQuery {
            page: Some(-2),
            per_page: Some(0),
        };
        assert_eq!(query.page_request(&api), PageRequest::new(1, 1));
    }

    #[test]
    fn last_possible_page_still_yields_an_offset() {
        let query = ListQuery {
            page: Some(i64::MAX),
            per_page: Some(15),
        };
        let request = query.page_request(&api_config());
        assert_eq!(request.page, i64::MAX);
        assert!(request.offset() > 0);
    }

    #[test]
    fn double_option_separates_null_from_absent() {
        let changes: PropertyChanges = serde_json::from_value(json!({"city": null, "name": "Oak"})).unwrap();
        assert_eq!(changes.city, Some(None));
        assert_eq!(changes.state, None);
        assert_eq!(changes.name.as_deref(), Some("Oak"));

        let changes: PropertyChanges = serde_json::from_value(json!({"zip_code": "12345"})).unwrap();
        assert_eq!(changes.zip_code, Some(Some("12345".to_string())));
    }
}
