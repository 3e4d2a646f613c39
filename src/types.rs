/// Shared request types used across the handlers

use serde::{Deserialize, Deserializer};

use crate::config::config;
use crate::filter::PageRequest;

/// Common list query parameters: `?page=2&per_page=50&sort=-created_at&q=acme`
///
/// Resource-specific filters are read with a second `Query<...>` extractor;
/// both deserialize from the same query string and ignore unknown keys.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort: Option<String>,
    pub q: Option<String>,
}

impl ListParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::clamp(self.page, self.per_page, &config().pagination)
    }

    pub fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    pub fn search(&self) -> Option<&str> {
        self.q.as_deref()
    }
}

/// Distinguishes an absent PATCH field from an explicit `null`.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]` on an
/// `Option<Option<T>>`: absent → `None`, `null` → `Some(None)`,
/// a value → `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        assigned_to: Option<Option<Uuid>>,
    }

    #[test]
    fn absent_null_and_value_are_distinct() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.assigned_to, None);

        let null: Patch = serde_json::from_str(r#"{"assigned_to": null}"#).unwrap();
        assert_eq!(null.assigned_to, Some(None));

        let id = Uuid::new_v4();
        let set: Patch = serde_json::from_str(&format!(r#"{{"assigned_to": "{}"}}"#, id)).unwrap();
        assert_eq!(set.assigned_to, Some(Some(id)));
    }

    #[test]
    fn list_params_clamp_to_config() {
        let params = ListParams { page: Some(0), per_page: Some(0), ..Default::default() };
        let request = params.page_request();
        assert_eq!(request.page, 1);
        assert_eq!(request.per_page, 1);
    }
}
