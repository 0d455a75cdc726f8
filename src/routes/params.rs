use serde::{Deserialize, Deserializer};
use utoipa::ToSchema;

/// Lenient numeric parse for query parameters: numbers and numeric
/// strings pass through, anything else coerces to `None` instead of
/// failing the request.
pub fn lenient_i64<'de, D>(de: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Str(String),
    }

    Ok(match Option::<Raw>::deserialize(de).ok().flatten() {
        Some(Raw::Int(n)) => Some(n),
        Some(Raw::Str(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// Shared `page` / `limit` / `search` parameters for list endpoints.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ListParams {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub limit: Option<i64>,
    pub search: Option<String>,
}

impl ListParams {
    /// Returns (page, limit, offset). Page is clamped to >= 1; the
    /// per-resource default limit clamps to 1..=100.
    pub fn normalize(&self, default_limit: i64) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(default_limit).clamp(1, 100);
        let offset = (page - 1) * limit;
        (page, limit, offset)
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_query(query: &str) -> ListParams {
        serde_urlencoded::from_str(query).expect("query should always deserialize")
    }

    #[test]
    fn defaults_apply_when_absent() {
        let params = ListParams::default();
        assert_eq!(params.normalize(10), (1, 10, 0));
    }

    #[test]
    fn offset_follows_page() {
        let params = ListParams {
            page: Some(3),
            limit: Some(20),
            search: None,
        };
        assert_eq!(params.normalize(10), (3, 20, 40));
    }

    #[test]
    fn non_numeric_values_coerce_to_defaults() {
        let params = from_query("page=abc&limit=xyz");
        assert_eq!(params.normalize(10), (1, 10, 0));
    }

    #[test]
    fn negative_page_clamps_to_one() {
        let params = from_query("page=-4&limit=500");
        assert_eq!(params.normalize(10), (1, 100, 0));
    }

    #[test]
    fn blank_search_is_ignored() {
        let params = from_query("search=%20%20");
        assert_eq!(params.search_term(), None);

        let params = from_query("search=widget");
        assert_eq!(params.search_term(), Some("widget"));
    }
}
