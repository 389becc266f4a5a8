use chrono::{DateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Raw value collected from a multi-entry input widget
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ArrayInput {
    /// Comma or whitespace separated tokens
    Text(String),
    Entries(Vec<ArrayEntry>),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ArrayEntry {
    Item(String),
    Items(Vec<String>),
    /// Record emitted by the dynamic list widget
    Widget { value: Option<WidgetValue> },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum WidgetValue {
    Item(String),
    Items(Vec<String>),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct LabelPair {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// Key/value pair as entered in the label list widget, either bare or wrapped in a `value` record
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum LabelEntry {
    Pair(LabelPair),
    Widget { value: LabelPair },
}

impl LabelEntry {
    pub fn pair(&self) -> &LabelPair {
        match self {
            LabelEntry::Pair(pair) => pair,
            LabelEntry::Widget { value } => value,
        }
    }
}

fn push_token(values: &mut Vec<String>, token: &str) {
    let token = token.trim();
    if !token.is_empty() {
        values.push(token.to_owned());
    }
}

/// Flattens an array-like input into an ordered list of non-empty strings.
///
/// Nested lists are flattened one level. An absent input gives an empty list.
pub fn array_input_value(raw: Option<&ArrayInput>) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    match raw {
        None => {}
        Some(ArrayInput::Text(text)) => {
            text.split(|c: char| c == ',' || c.is_whitespace()).for_each(|token| push_token(&mut values, token));
        }
        Some(ArrayInput::Entries(entries)) => {
            for entry in entries {
                match entry {
                    ArrayEntry::Item(item) | ArrayEntry::Widget { value: Some(WidgetValue::Item(item)) } => push_token(&mut values, item),
                    ArrayEntry::Items(items) | ArrayEntry::Widget { value: Some(WidgetValue::Items(items)) } => {
                        items.iter().for_each(|item| push_token(&mut values, item))
                    }
                    ArrayEntry::Widget { value: None } => {}
                }
            }
        }
    }
    values
}

/// Converts ordered label entries into a map. Later entries win over earlier ones with the same key.
pub fn labels_from_entries(entries: &[LabelEntry]) -> BTreeMap<String, String> {
    let mut labels: BTreeMap<String, String> = BTreeMap::new();
    for entry in entries {
        let pair = entry.pair();
        if pair.key.trim().is_empty() {
            continue;
        }
        labels.insert(pair.key.trim().to_owned(), pair.value.to_owned());
    }
    labels
}

fn version_parts(version: &str) -> Vec<u64> {
    let version = version.trim().trim_start_matches(['v', 'V']);
    let release = version.split(['-', '+']).next().unwrap_or_default();
    release
        .split('.')
        .map(|part| {
            let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<u64>().unwrap_or(0)
        })
        .collect()
}

/// Compares two Kubernetes versions such as `v1.24.0` numerically
pub fn version_compare(left: &str, right: &str) -> Ordering {
    let left_parts = version_parts(left);
    let right_parts = version_parts(right);
    let len = left_parts.len().max(right_parts.len());
    for index in 0..len {
        let l = left_parts.get(index).copied().unwrap_or(0);
        let r = right_parts.get(index).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Parses the value of a time picker: `HH:mm`, `HH:mm:ss` or a full RFC 3339 timestamp
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|date| date.time()))
}

pub fn deserialize_time_of_day<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    parse_time_of_day(&value).ok_or_else(|| serde::de::Error::custom(format!("invalid time of day '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn array_input_accepts_delimited_text() {
        let raw = ArrayInput::Text("10.0.0.1, kube.example.com\n\n192.168.1.10".to_owned());
        assert_eq!(
            array_input_value(Some(&raw)),
            vec!["10.0.0.1", "kube.example.com", "192.168.1.10"]
        );
    }

    #[test]
    fn array_input_splits_on_spaces_and_tabs() {
        let raw = ArrayInput::Text("a.local b.local\tc.local,  d.local".to_owned());
        assert_eq!(array_input_value(Some(&raw)), vec!["a.local", "b.local", "c.local", "d.local"]);
    }

    #[test]
    fn array_input_flattens_widget_entries_one_level() {
        let raw: ArrayInput = serde_yaml::from_str(
            r#"
- value: registry.local:5000
- value: [10.0.0.2:5000, ""]
- mirror.local
- [a.local, b.local]
- value: null
"#,
        )
        .unwrap();
        assert_eq!(
            array_input_value(Some(&raw)),
            vec!["registry.local:5000", "10.0.0.2:5000", "mirror.local", "a.local", "b.local"]
        );
    }

    #[test]
    fn array_input_absent_is_empty() {
        assert!(array_input_value(None).is_empty());
        assert!(array_input_value(Some(&ArrayInput::Entries(vec![]))).is_empty());
    }

    #[test]
    fn labels_later_entries_overwrite() {
        let entries: Vec<LabelEntry> = serde_yaml::from_str(
            r#"
- key: team
  value: storage
- value:
    key: env
    value: prod
- key: team
  value: network
- key: ""
  value: ignored
"#,
        )
        .unwrap();
        let labels = labels_from_entries(&entries);
        assert_eq!(labels.len(), 2);
        assert_eq!(labels["team"], "network");
        assert_eq!(labels["env"], "prod");
    }

    #[test]
    fn compares_kubernetes_versions() {
        assert_eq!(version_compare("v1.24.0", "v1.24.0"), Ordering::Equal);
        assert_eq!(version_compare("v1.24.0", "v1.23.17"), Ordering::Greater);
        assert_eq!(version_compare("v1.24.0", "1.25.3"), Ordering::Less);
        assert_eq!(version_compare("v1.24", "v1.24.0"), Ordering::Equal);
        assert_eq!(version_compare("v1.24.0", "v1.24.1-rc.1"), Ordering::Less);
    }

    #[test]
    fn parses_time_picker_values() {
        let time = parse_time_of_day("03:15").unwrap();
        assert_eq!((time.hour(), time.minute(), time.second()), (3, 15, 0));
        let time = parse_time_of_day("2023-04-01T22:05:09+08:00").unwrap();
        assert_eq!((time.hour(), time.minute(), time.second()), (22, 5, 9));
        assert!(parse_time_of_day("quarter past three").is_none());
    }
}
