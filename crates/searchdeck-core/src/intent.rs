//! Intent annotation: layered parsing of the batched classifier response
//! and positional merge back onto reconciled rows.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::reconcile::ReconciledRow;

/// Description used when a query's intent could not be determined.
pub const UNKNOWN_INTENT: &str = "Unable to determine intent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IntentCategory {
    Informational,
    Navigational,
    Transactional,
    #[serde(rename = "Commercial Investigation")]
    CommercialInvestigation,
    #[default]
    #[serde(other)]
    Unknown,
}

impl IntentCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            IntentCategory::Informational => "Informational",
            IntentCategory::Navigational => "Navigational",
            IntentCategory::Transactional => "Transactional",
            IntentCategory::CommercialInvestigation => "Commercial Investigation",
            IntentCategory::Unknown => "Unknown",
        }
    }
}

/// Best-effort classification attached to one reconciled row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryIntent {
    pub description: String,
    pub category: IntentCategory,
}

impl QueryIntent {
    /// The degraded fallback pair used whenever the classifier's answer is
    /// missing, short, or unparseable.
    pub fn unknown() -> Self {
        Self {
            description: UNKNOWN_INTENT.to_string(),
            category: IntentCategory::Unknown,
        }
    }
}

/// Wire shape of one classifier result entry.
#[derive(Debug, Deserialize)]
struct WireIntent {
    #[serde(default)]
    intent: String,
    #[serde(default)]
    category: IntentCategory,
}

impl From<WireIntent> for QueryIntent {
    fn from(wire: WireIntent) -> Self {
        if wire.intent.trim().is_empty() {
            return QueryIntent::unknown();
        }
        QueryIntent {
            description: wire.intent,
            category: wire.category,
        }
    }
}

fn decode(raw: &str) -> Option<Vec<QueryIntent>> {
    if let Ok(entries) = serde_json::from_str::<Vec<WireIntent>>(raw) {
        return Some(entries.into_iter().map(QueryIntent::from).collect());
    }
    if let Ok(entry) = serde_json::from_str::<WireIntent>(raw) {
        return Some(vec![QueryIntent::from(entry)]);
    }
    None
}

/// Slice `raw` from the first occurrence of `open` to the last occurrence
/// of `close`, which is how embedded JSON is located inside free text.
fn embedded_slice(raw: &str, open: char, close: char) -> Option<&str> {
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    (end > start).then(|| &raw[start..=end])
}

/// Parse the classifier's raw text with layered fallback.
///
/// Layer 1: direct structured decode of the whole body (array, or a single
/// object wrapped into a one-entry list). Layer 2: decode the first
/// well-formed array-or-object substring within free text. Layer 3: give up
/// and return no entries — the caller pads with the degraded default.
pub fn parse_classifier_response(raw: &str) -> Vec<QueryIntent> {
    if let Some(entries) = decode(raw.trim()) {
        return entries;
    }
    for (open, close) in [('[', ']'), ('{', '}')] {
        if let Some(slice) = embedded_slice(raw, open, close) {
            if let Some(entries) = decode(slice) {
                return entries;
            }
        }
    }
    Vec::new()
}

/// Align parsed results with the requested query list by position.
///
/// result[i] is taken as the answer for query[i]; entries beyond the query
/// count are dropped and missing entries default to the degraded pair. If
/// the upstream service reorders or drops an entry mid-list, misalignment
/// occurs undetected; content-based matching is deliberately not attempted.
pub fn align_intents(queries: &[String], mut parsed: Vec<QueryIntent>) -> Vec<QueryIntent> {
    parsed.truncate(queries.len());
    while parsed.len() < queries.len() {
        parsed.push(QueryIntent::unknown());
    }
    parsed
}

/// The deduplicated, ordered query list sent to the classifier.
///
/// Rows are already unique by query text, so this is a projection in row
/// order.
pub fn distinct_queries(rows: &[ReconciledRow]) -> Vec<String> {
    rows.iter().map(|row| row.query.clone()).collect()
}

/// Merge aligned intents back onto rows by query identity. Rows whose query
/// is missing from the mapping get the degraded pair.
pub fn apply_intents(rows: &mut [ReconciledRow], queries: &[String], aligned: Vec<QueryIntent>) {
    let by_query: HashMap<&str, QueryIntent> = queries
        .iter()
        .map(String::as_str)
        .zip(aligned)
        .collect();
    for row in rows {
        let intent = by_query
            .get(row.query.as_str())
            .cloned()
            .unwrap_or_else(QueryIntent::unknown);
        row.intent = Some(intent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn row(query: &str) -> ReconciledRow {
        ReconciledRow {
            query: query.to_string(),
            metrics: BTreeMap::new(),
            intent: None,
        }
    }

    fn queries(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn direct_array_decodes() {
        let raw = r#"[{"intent":"Find running shoes","category":"Transactional"}]"#;
        let parsed = parse_classifier_response(raw);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].description, "Find running shoes");
        assert_eq!(parsed[0].category, IntentCategory::Transactional);
    }

    #[test]
    fn single_object_is_wrapped() {
        let raw = r#"{"intent":"Reach a site","category":"Navigational"}"#;
        let parsed = parse_classifier_response(raw);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].category, IntentCategory::Navigational);
    }

    #[test]
    fn embedded_array_in_free_text_decodes() {
        let raw = "Here is the analysis you asked for:\n```json\n[\
                   {\"intent\":\"Compare prices\",\"category\":\"Commercial Investigation\"},\
                   {\"intent\":\"Learn about boots\",\"category\":\"Informational\"}]\n```\nHope it helps!";
        let parsed = parse_classifier_response(raw);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].category, IntentCategory::CommercialInvestigation);
        assert_eq!(parsed[1].category, IntentCategory::Informational);
    }

    #[test]
    fn garbage_yields_no_entries() {
        assert!(parse_classifier_response("I cannot help with that.").is_empty());
        assert!(parse_classifier_response("").is_empty());
    }

    #[test]
    fn unknown_category_string_degrades_to_unknown() {
        let raw = r#"[{"intent":"Something","category":"Sponsored"}]"#;
        let parsed = parse_classifier_response(raw);
        assert_eq!(parsed[0].category, IntentCategory::Unknown);
    }

    #[test]
    fn short_response_pads_with_default_positionally() {
        // Three queries, two results: rows 1-2 take the provided values in
        // order, row 3 falls back to the default pair.
        let qs = queries(&["shoes", "boots", "sandals"]);
        let parsed = vec![
            QueryIntent {
                description: "Buy shoes".to_string(),
                category: IntentCategory::Transactional,
            },
            QueryIntent {
                description: "Buy boots".to_string(),
                category: IntentCategory::Transactional,
            },
        ];
        let aligned = align_intents(&qs, parsed);
        assert_eq!(aligned.len(), 3);
        assert_eq!(aligned[0].description, "Buy shoes");
        assert_eq!(aligned[1].description, "Buy boots");
        assert_eq!(aligned[2], QueryIntent::unknown());
    }

    #[test]
    fn overlong_response_is_truncated() {
        let qs = queries(&["one"]);
        let aligned = align_intents(&qs, vec![QueryIntent::unknown(), QueryIntent::unknown()]);
        assert_eq!(aligned.len(), 1);
    }

    #[test]
    fn intents_merge_onto_rows_by_query() {
        let mut rows = vec![row("shoes"), row("boots")];
        let qs = queries(&["shoes", "boots"]);
        let aligned = align_intents(
            &qs,
            vec![QueryIntent {
                description: "Buy shoes".to_string(),
                category: IntentCategory::Transactional,
            }],
        );
        apply_intents(&mut rows, &qs, aligned);
        assert_eq!(
            rows[0].intent.as_ref().map(|i| i.description.as_str()),
            Some("Buy shoes")
        );
        assert_eq!(rows[1].intent, Some(QueryIntent::unknown()));
    }

    #[test]
    fn category_serialises_with_spaced_variant() {
        assert_eq!(
            serde_json::to_string(&IntentCategory::CommercialInvestigation).expect("json"),
            "\"Commercial Investigation\""
        );
    }
}
