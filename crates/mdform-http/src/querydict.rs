//! Multi-valued dictionary for form-encoded request data.
//!
//! [`QueryDict`] keeps every value submitted under a key, in submission order,
//! and keeps the keys themselves in first-seen order. Checkbox lists rely on the
//! former; rendering forms in declaration order relies on neither, but stable
//! ordering keeps serialized output deterministic.

use indexmap::IndexMap;

/// An ordered, multi-valued dictionary of form data.
///
/// # Examples
///
/// ```
/// use mdform_http::QueryDict;
///
/// let qd = QueryDict::parse("color=red&color=blue&size=large");
/// assert_eq!(qd.get("color"), Some("blue"));
/// assert_eq!(qd.get_list("color"), Some(&["red".to_string(), "blue".to_string()][..]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDict {
    data: IndexMap<String, Vec<String>>,
}

impl QueryDict {
    /// Creates a new, empty `QueryDict`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` string (`"key1=val1&key2=val2"`).
    ///
    /// Handles percent-encoding and `+` as space, and supports multiple values per key.
    pub fn parse(query_string: &str) -> Self {
        let mut qd = Self::new();

        for pair in query_string.split('&') {
            if pair.is_empty() {
                continue;
            }

            let (key, value) = pair
                .split_once('=')
                .unwrap_or((pair, ""));

            qd.append(&percent_decode(key), &percent_decode(value));
        }

        qd
    }

    /// Builds a `QueryDict` from `(key, value)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut qd = Self::new();
        for (key, value) in pairs {
            qd.append(key, value);
        }
        qd
    }

    /// Returns the last value for the given key, or `None` if not present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    /// Returns all values for the given key, or `None` if not present.
    pub fn get_list(&self, key: &str) -> Option<&[String]> {
        self.data.get(key).map(Vec::as_slice)
    }

    /// Sets a single value for the given key, replacing any existing values.
    pub fn set(&mut self, key: &str, value: &str) {
        self.data.insert(key.to_string(), vec![value.to_string()]);
    }

    /// Appends a value to the list for the given key.
    pub fn append(&mut self, key: &str, value: &str) {
        self.data
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
    }

    /// Encodes this `QueryDict` as a form-encoded string, in insertion order.
    pub fn urlencode(&self) -> String {
        self.iter()
            .flat_map(|(key, values)| {
                values
                    .iter()
                    .map(move |value| format!("{}={}", percent_encode(key), percent_encode(value)))
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the `QueryDict` contains no keys.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if the specified key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    /// Returns an iterator over `(key, values)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.data.iter()
    }
}

/// Decodes a percent-encoded string.
fn percent_decode(input: &str) -> String {
    // Replace + with space (form encoding), then decode percent sequences
    let plus_decoded = input.replace('+', " ");
    percent_encoding::percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}

/// Percent-encodes a string for use in a form body.
fn percent_encode(input: &str) -> String {
    percent_encoding::utf8_percent_encode(input, percent_encoding::NON_ALPHANUMERIC).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let qd = QueryDict::new();
        assert!(qd.is_empty());
        assert_eq!(qd.len(), 0);
    }

    #[test]
    fn test_parse_multiple_keys() {
        let qd = QueryDict::parse("a=1&b=2&c=3");
        assert_eq!(qd.get("a"), Some("1"));
        assert_eq!(qd.get("b"), Some("2"));
        assert_eq!(qd.get("c"), Some("3"));
        assert_eq!(qd.len(), 3);
    }

    #[test]
    fn test_parse_multiple_values() {
        let qd = QueryDict::parse("checkbox_field=A&checkbox_field=C");
        // get() returns the last value
        assert_eq!(qd.get("checkbox_field"), Some("C"));
        assert_eq!(
            qd.get_list("checkbox_field"),
            Some(&["A".to_string(), "C".to_string()][..])
        );
    }

    #[test]
    fn test_parse_no_value() {
        let qd = QueryDict::parse("key&other=");
        assert_eq!(qd.get("key"), Some(""));
        assert_eq!(qd.get("other"), Some(""));
    }

    #[test]
    fn test_parse_percent_and_plus() {
        let qd = QueryDict::parse("name=John+Smith&email=john%40smith.com");
        assert_eq!(qd.get("name"), Some("John Smith"));
        assert_eq!(qd.get("email"), Some("john@smith.com"));
    }

    #[test]
    fn test_parse_skips_empty_pairs() {
        let qd = QueryDict::parse("a=1&&b=2&");
        assert_eq!(qd.len(), 2);
    }

    #[test]
    fn test_set_replaces() {
        let mut qd = QueryDict::new();
        qd.append("key", "a");
        qd.append("key", "b");
        qd.set("key", "c");
        assert_eq!(qd.get_list("key"), Some(&["c".to_string()][..]));
    }

    #[test]
    fn test_keys_keep_insertion_order() {
        let qd = QueryDict::parse("z=1&a=2&m=3&a=4");
        let keys: Vec<_> = qd.keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_urlencode_roundtrip() {
        let qd = QueryDict::from_pairs([("name", "hello world"), ("c", "1"), ("c", "2")]);
        let encoded = qd.urlencode();
        assert_eq!(encoded, "name=hello%20world&c=1&c=2");
        assert_eq!(QueryDict::parse(&encoded), qd);
    }

    #[test]
    fn test_get_missing_key() {
        let qd = QueryDict::new();
        assert_eq!(qd.get("missing"), None);
        assert_eq!(qd.get_list("missing"), None);
        assert!(!qd.contains_key("missing"));
    }
}
