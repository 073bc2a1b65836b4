//! Raw query-string multimap.

use std::collections::BTreeMap;

/// Query parameters as submitted: each key maps to every value it was given,
/// in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: BTreeMap<String, Vec<String>>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an `application/x-www-form-urlencoded` query string (without the leading `?`).
    pub fn parse(query: &str) -> Self {
        Self::from_pairs(
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(key, value)| (key.into_owned(), value.into_owned())),
        )
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.push(key, value);
        }
        params
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .entry(key.into())
            .or_default()
            .push(value.into());
    }

    /// First value submitted for `key`.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decodes_and_groups_repeated_keys() {
        let params = QueryParams::parse("name__ilike=bob%20smith&age__gte=21&age__gte=30&limit=5");
        assert_eq!(params.first("name__ilike"), Some("bob smith"));
        let ages: Vec<_> = params
            .iter()
            .find(|(key, _)| *key == "age__gte")
            .map(|(_, values)| values.to_vec())
            .expect("age values");
        assert_eq!(ages, ["21", "30"]);
        assert_eq!(params.first("limit"), Some("5"));
    }

    #[test]
    fn parse_keeps_valueless_keys() {
        let params = QueryParams::parse("deleted_at__isnull");
        assert_eq!(params.first("deleted_at__isnull"), Some(""));
    }

    #[test]
    fn empty_query_has_no_params() {
        assert!(QueryParams::parse("").is_empty());
    }
}
