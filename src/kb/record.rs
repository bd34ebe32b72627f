use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Fields that carry a link to the drill or exercise, in order of preference.
const LINK_FIELDS: [&str; 3] = ["link", "video_url", "url"];

/// A drill or exercise returned by knowledge-base search.
///
/// `title` is the key the reranker refers back to. Categorical fields
/// (skills, positions, situations, equipment, ...) land in `tags`; scalar
/// descriptive fields (category, complexity, description, ...) in `attributes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateItem {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl CandidateItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: None,
            source: None,
            tags: BTreeMap::new(),
            attributes: BTreeMap::new(),
        }
    }

    #[cfg(test)]
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    #[cfg(test)]
    pub fn with_tags(mut self, name: &str, values: &[&str]) -> Self {
        self.tags.insert(
            name.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        );
        self
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("record is not an object")]
    NotAnObject,

    #[error("missing or empty title")]
    MissingTitle,

    #[error("field '{0}' is a list with non-string entries")]
    MixedList(String),

    #[error("duplicate title '{0}'")]
    DuplicateTitle(String),
}

/// Validates one raw search record.
pub fn parse_record(value: &Value) -> Result<CandidateItem, RecordError> {
    let Value::Object(map) = value else {
        return Err(RecordError::NotAnObject);
    };

    let title = map
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(RecordError::MissingTitle)?;

    let mut item = CandidateItem::new(title);
    item.link = LINK_FIELDS
        .iter()
        .find_map(|key| non_empty_str(map.get(*key)))
        .map(str::to_string);
    item.source = non_empty_str(map.get("source")).map(str::to_string);

    for (key, field) in map {
        if key == "title" || key == "source" || LINK_FIELDS.contains(&key.as_str()) {
            continue;
        }
        match field {
            Value::Array(entries) => {
                let mut values = Vec::with_capacity(entries.len());
                for entry in entries {
                    let Value::String(s) = entry else {
                        return Err(RecordError::MixedList(key.clone()));
                    };
                    let s = s.trim();
                    if !s.is_empty() {
                        values.push(s.to_string());
                    }
                }
                item.tags.insert(key.clone(), values);
            }
            Value::String(s) if !s.trim().is_empty() => {
                item.attributes.insert(key.clone(), s.trim().to_string());
            }
            Value::Number(n) => {
                item.attributes.insert(key.clone(), n.to_string());
            }
            Value::Bool(b) => {
                item.attributes.insert(key.clone(), b.to_string());
            }
            _ => {}
        }
    }

    Ok(item)
}

/// Validates a search batch, quarantining records that fail validation.
/// Returns the accepted items in their original order and the number dropped.
pub fn parse_results(values: &[Value]) -> (Vec<CandidateItem>, usize) {
    let mut items: Vec<CandidateItem> = Vec::with_capacity(values.len());
    let mut dropped = 0;

    for (index, value) in values.iter().enumerate() {
        let parsed = parse_record(value).and_then(|item| {
            if items.iter().any(|existing| existing.title == item.title) {
                Err(RecordError::DuplicateTitle(item.title))
            } else {
                Ok(item)
            }
        });
        match parsed {
            Ok(item) => items.push(item),
            Err(e) => {
                warn!(index, error = %e, "quarantined search record");
                dropped += 1;
            }
        }
    }

    (items, dropped)
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_drill_record() {
        let item = parse_record(&json!({
            "title": "Breakout Drill",
            "link": "https://drills.example/breakout",
            "hockey_skills": ["passing", " breakouts "],
            "position": ["defense"],
            "situation": [],
            "source": "site-a"
        }))
        .unwrap();

        assert_eq!(item.title, "Breakout Drill");
        assert_eq!(item.link.as_deref(), Some("https://drills.example/breakout"));
        assert_eq!(item.source.as_deref(), Some("site-a"));
        assert_eq!(item.tags["hockey_skills"], vec!["passing", "breakouts"]);
        assert_eq!(item.tags["position"], vec!["defense"]);
        assert!(item.tags["situation"].is_empty());
    }

    #[test]
    fn parses_off_ice_record_with_attributes() {
        let item = parse_record(&json!({
            "title": "Lateral Bounds",
            "category": "plyometrics",
            "focus_area": "explosive stride",
            "equipment_needed": null,
            "reps": 8
        }))
        .unwrap();

        assert_eq!(item.attributes["category"], "plyometrics");
        assert_eq!(item.attributes["focus_area"], "explosive stride");
        assert_eq!(item.attributes["reps"], "8");
        assert!(!item.attributes.contains_key("equipment_needed"));
        assert!(item.link.is_none());
    }

    #[test]
    fn empty_link_falls_back_to_video_url() {
        let item = parse_record(&json!({
            "title": "Edge Work",
            "link": "",
            "video_url": "https://video.example/edges"
        }))
        .unwrap();
        assert_eq!(item.link.as_deref(), Some("https://video.example/edges"));
    }

    #[test]
    fn rejects_missing_or_blank_title() {
        assert_eq!(
            parse_record(&json!({"link": "x"})),
            Err(RecordError::MissingTitle)
        );
        assert_eq!(
            parse_record(&json!({"title": "   "})),
            Err(RecordError::MissingTitle)
        );
        assert_eq!(
            parse_record(&json!({"title": 42})),
            Err(RecordError::MissingTitle)
        );
    }

    #[test]
    fn rejects_non_object() {
        assert_eq!(
            parse_record(&json!("Breakout Drill")),
            Err(RecordError::NotAnObject)
        );
    }

    #[test]
    fn rejects_list_with_non_string_entries() {
        assert_eq!(
            parse_record(&json!({"title": "T", "position": ["forward", 3]})),
            Err(RecordError::MixedList("position".into()))
        );
    }

    #[test]
    fn parse_results_quarantines_bad_records_and_keeps_order() {
        let values = vec![
            json!({"title": "A"}),
            json!({"nope": true}),
            json!({"title": "B"}),
            json!({"title": "A"}),
            json!(null),
        ];

        let (items, dropped) = parse_results(&values);
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
        assert_eq!(dropped, 3);
    }
}
