//! Structured response recovery
//!
//! A model reply is untrusted free text that is merely *expected* to contain
//! one JSON object. Recovery runs as a cascade, each step only attempted
//! when the previous one fails:
//!
//! 1. parse the greedy `{`..`}` span as JSON;
//! 2. sanitize the span (drop control characters, escape non-ASCII) and
//!    re-parse;
//! 3. pattern fallback: scan the raw text for each expected field name in
//!    order and capture the text between consecutive names.
//!
//! The cascade is total. Whatever the input, the caller gets back a
//! [`StructuredRecord`] covering at least the expected field names, with
//! unrecoverable fields marked `Missing`.

use crate::models::{Field, FieldValue, StructuredRecord};

/// Outcome of one extraction. `degraded` is set when the pattern fallback
/// produced the record, i.e. no structural parse succeeded.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: StructuredRecord,
    pub degraded: bool,
}

/// Recover a structured record from free-form model text. Never fails.
pub fn extract_structured(text: &str, expected_fields: &[&str]) -> Extraction {
    if let Some(candidate) = json_span(text) {
        if let Some(object) = parse_object(candidate) {
            return Extraction {
                record: with_expected(StructuredRecord::from_json_object(&object), expected_fields),
                degraded: false,
            };
        }
        let cleaned = sanitize_candidate(candidate);
        if let Some(object) = parse_object(&cleaned) {
            return Extraction {
                record: with_expected(StructuredRecord::from_json_object(&object), expected_fields),
                degraded: false,
            };
        }
    }

    Extraction {
        record: extract_from_text(text, expected_fields),
        degraded: true,
    }
}

/// The greedy span from the first `{` through the last `}`, if any.
fn json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

fn parse_object(candidate: &str) -> Option<serde_json::Map<String, serde_json::Value>> {
    match serde_json::from_str::<serde_json::Value>(candidate) {
        Ok(serde_json::Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Drop control characters and re-encode non-ASCII characters as JSON
/// `\uXXXX` escapes, then hand the candidate back for a second parse.
fn sanitize_candidate(candidate: &str) -> String {
    let mut cleaned = String::with_capacity(candidate.len());
    for ch in candidate.chars() {
        if (ch as u32) < 32 {
            continue;
        }
        if ch.is_ascii() {
            cleaned.push(ch);
        } else {
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                cleaned.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    cleaned
}

/// Pattern fallback: capture the text between consecutive expected field
/// names. The fixed field order matches the order the prompts request; a
/// reply that reorders its sections will have content attributed to the
/// wrong field. That trade-off is accepted; the fallback exists to salvage
/// *something* from replies that already broke their format contract.
fn extract_from_text(text: &str, expected_fields: &[&str]) -> StructuredRecord {
    let mut record = StructuredRecord::new();

    for (i, name) in expected_fields.iter().enumerate() {
        let Some(pos) = find_ignore_ascii_case(text, name) else {
            record.insert(*name, Field::Missing);
            continue;
        };

        let after_name = &text[pos + name.len()..];
        let after_name = after_name.strip_prefix(':').unwrap_or(after_name);

        let end = expected_fields
            .get(i + 1)
            .and_then(|next| find_ignore_ascii_case(after_name, next))
            .unwrap_or(after_name.len());

        let content = after_name[..end].trim();
        record.insert(*name, Field::Present(capture_to_value(content)));
    }

    record
}

/// A captured span with newline-prefixed dash bullets becomes a list.
fn capture_to_value(content: &str) -> FieldValue {
    if !content.contains("\n-") {
        return FieldValue::Text(content.to_string());
    }

    let items: Vec<FieldValue> = content
        .split("\n-")
        .map(|item| item.trim().trim_matches(|c| c == '-' || c == ' ').trim())
        .filter(|item| !item.is_empty())
        .map(|item| FieldValue::Text(item.to_string()))
        .collect();
    FieldValue::List(items)
}

/// Mark any expected field the parse did not produce as `Missing`, so the
/// record's keys are always a superset of the expected names.
fn with_expected(mut record: StructuredRecord, expected_fields: &[&str]) -> StructuredRecord {
    for name in expected_fields {
        if !record.contains(name) {
            record.insert(*name, Field::Missing);
        }
    }
    record
}

/// Byte-wise ASCII-case-insensitive substring search. Field names are
/// ASCII, so a match always starts and ends on a char boundary.
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() {
        return Some(0);
    }
    if n.len() > h.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}
