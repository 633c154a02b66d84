use serde_yaml::{Mapping, Value};

use crate::error::ParseError;

/// Field appended to every new entry once it has been submitted for scanning.
pub const SCAN_FIELD: &str = "URLScan";

/// One record of the tracked data file.
///
/// Fields keep the order they had in the YAML source; `url` is guaranteed to be
/// present and to be a string.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    url: String,
    fields: Mapping,
}

pub type EntryList = Vec<Entry>;

impl Entry {
    fn from_value(index: usize, value: Value) -> Result<Self, ParseError> {
        let Value::Mapping(fields) = value else {
            return Err(ParseError::NotAMapping(index));
        };
        let url = fields
            .get("url")
            .and_then(Value::as_str)
            .ok_or(ParseError::MissingUrl(index))?
            .to_string();
        Ok(Self { url, fields })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn fields(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.fields.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Attach the scan report (or error marker) as the trailing field.
    pub fn set_scan(&mut self, report: impl Into<String>) {
        self.fields
            .insert(Value::String(SCAN_FIELD.into()), Value::String(report.into()));
    }
}

/// Decode the tracked YAML document into an entry list.
///
/// An empty document or a bare `null` is an empty list. Merge keys (`<<: *anchor`)
/// are resolved before entries are validated.
pub fn parse_entries(source: &[u8]) -> Result<EntryList, ParseError> {
    if source.iter().all(u8::is_ascii_whitespace) {
        return Ok(vec![]);
    }

    let mut value = serde_yaml::from_slice::<Value>(source)?;
    value.apply_merge()?;
    match value {
        Value::Null => Ok(vec![]),
        Value::Sequence(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| Entry::from_value(index, item))
            .collect(),
        _ => Err(ParseError::NotASequence),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sequence_of_mappings() {
        let yaml = "- url: http://a.com\n  name: A\n- url: http://b.com\n";
        let entries = parse_entries(yaml.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].url(), "http://a.com");
        assert_eq!(entries[0].get("name").and_then(Value::as_str), Some("A"));
        assert_eq!(entries[1].url(), "http://b.com");
    }

    #[test]
    fn keeps_field_order() {
        let yaml = "- name: A\n  url: http://a.com\n  date: 2018-01-01\n";
        let entries = parse_entries(yaml.as_bytes()).unwrap();
        let keys: Vec<&str> = entries[0].fields().filter_map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["name", "url", "date"]);
    }

    #[test]
    fn empty_document_is_empty_list() {
        assert!(parse_entries(b"").unwrap().is_empty());
        assert!(parse_entries(b"  \n").unwrap().is_empty());
        assert!(parse_entries(b"~\n").unwrap().is_empty());
    }

    #[test]
    fn top_level_mapping_is_rejected() {
        let err = parse_entries(b"url: http://a.com\n").unwrap_err();
        assert!(matches!(err, ParseError::NotASequence));
    }

    #[test]
    fn scalar_element_is_rejected() {
        let err = parse_entries(b"- url: http://a.com\n- just a string\n").unwrap_err();
        assert!(matches!(err, ParseError::NotAMapping(1)));
    }

    #[test]
    fn entry_without_url_is_rejected() {
        let err = parse_entries(b"- name: nameless\n").unwrap_err();
        assert!(matches!(err, ParseError::MissingUrl(0)));
    }

    #[test]
    fn non_string_url_is_rejected() {
        let err = parse_entries(b"- url: 42\n").unwrap_err();
        assert!(matches!(err, ParseError::MissingUrl(0)));
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        let err = parse_entries(b"- url: [unterminated\n").unwrap_err();
        assert!(matches!(err, ParseError::Yaml(_)));
    }

    #[test]
    fn merge_keys_are_resolved() {
        let yaml = "- &x\n  url: http://a.com\n  category: Phishing\n- <<: *x\n  url: http://b.com\n";
        let entries = parse_entries(yaml.as_bytes()).unwrap();
        assert_eq!(entries[1].url(), "http://b.com");
        let keys: Vec<&str> = entries[1].fields().filter_map(|(k, _)| k.as_str()).collect();
        assert!(!keys.contains(&"<<"));
        assert_eq!(entries[1].get("category").and_then(Value::as_str), Some("Phishing"));
    }

    #[test]
    fn url_inherited_through_merge() {
        let yaml = "- &x\n  url: http://a.com\n- <<: *x\n  name: dup\n";
        let entries = parse_entries(yaml.as_bytes()).unwrap();
        assert_eq!(entries[1].url(), "http://a.com");
        assert_eq!(entries[1].get("name").and_then(Value::as_str), Some("dup"));
    }

    #[test]
    fn set_scan_appends_last() {
        let mut entries = parse_entries(b"- url: http://a.com\n  name: A\n").unwrap();
        entries[0].set_scan("report-1");
        let last = entries[0].fields().last().unwrap();
        assert_eq!(last.0.as_str(), Some(SCAN_FIELD));
        assert_eq!(last.1.as_str(), Some("report-1"));
    }

    #[test]
    fn set_scan_replaces_existing_in_place() {
        let mut entries =
            parse_entries(b"- URLScan: stale\n  url: http://a.com\n").unwrap();
        entries[0].set_scan("fresh");
        let keys: Vec<&str> = entries[0].fields().filter_map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["URLScan", "url"]);
        assert_eq!(entries[0].get(SCAN_FIELD).and_then(Value::as_str), Some("fresh"));
    }
}
