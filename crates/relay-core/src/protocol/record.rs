//! Ordered field → value record handed to a message sink.

/// A structured record: an ordered list of `(field, value)` pairs.
///
/// Order is preserved on the wire, so stream consumers see fields in the
/// order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkRecord {
    fields: Vec<(String, String)>,
}

impl SinkRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field, returning the record for chaining.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Returns the value of the first field called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over `(field, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_keep_insertion_order() {
        let record = SinkRecord::new().with_field("b", "2").with_field("a", "1");
        let names: Vec<&str> = record.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_get_returns_first_match() {
        let record = SinkRecord::new().with_field("k", "first").with_field("k", "second");
        assert_eq!(record.get("k"), Some("first"));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_new_record_is_empty() {
        assert!(SinkRecord::new().is_empty());
    }
}
