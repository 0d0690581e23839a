//! Ordered form values for query strings and `application/x-www-form-urlencoded` bodies.

use url::form_urlencoded;

/// Multi-valued string map. Keys keep their first-insertion order and the
/// values of one key keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Values {
    entries: Vec<(String, Vec<String>)>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every value of `key` with `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(i) => self.entries[i].1 = vec![value],
            None => self.entries.push((key, vec![value])),
        }
        self
    }

    /// Append `value` to the values of `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(i) => self.entries[i].1.push(value),
            None => self.entries.push((key, vec![value])),
        }
        self
    }

    /// First value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.position(key)
            .map(|i| self.entries[i].1.as_slice())
            .unwrap_or(&[])
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Flattened `(key, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Form-encode as `k=v&k2=v2`.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (k, v) in self.iter() {
            serializer.append_pair(k, v);
        }
        serializer.finish()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

impl<K, V> FromIterator<(K, V)> for Values
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Values::new();
        for (k, v) in iter {
            values.add(k, v);
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_keeps_insertion_order() {
        let v: Values = [("TestID", "42"), ("Paused", "1")].into_iter().collect();
        assert_eq!(v.encode(), "TestID=42&Paused=1");
    }

    #[test]
    fn multi_values_group_under_first_key() {
        let mut v = Values::new();
        v.add("tag", "a").add("x", "1").add("tag", "b");
        assert_eq!(v.encode(), "tag=a&tag=b&x=1");
        assert_eq!(v.get_all("tag"), ["a".to_string(), "b".to_string()]);
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn set_replaces_existing_values() {
        let mut v = Values::new();
        v.add("Paused", "0").add("Paused", "0");
        v.set("Paused", "1");
        assert_eq!(v.get_all("Paused"), ["1".to_string()]);
        assert_eq!(v.remove("Paused"), Some(vec!["1".to_string()]));
        assert!(v.is_empty());
    }

    #[test]
    fn encode_escapes_reserved_characters() {
        let mut v = Values::new();
        v.set("WebsiteURL", "https://example.com/?a=b&c=d");
        v.set("WebsiteName", "my site");
        assert_eq!(
            v.encode(),
            "WebsiteURL=https%3A%2F%2Fexample.com%2F%3Fa%3Db%26c%3Dd&WebsiteName=my+site"
        );
    }

    #[test]
    fn missing_key_is_empty() {
        let v = Values::new();
        assert_eq!(v.get("nope"), None);
        assert!(v.get_all("nope").is_empty());
        assert_eq!(v.encode(), "");
    }
}
