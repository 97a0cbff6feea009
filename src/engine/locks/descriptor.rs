//! Lock descriptor (`lock.json`) decoding.

use crate::engine::github::FileContent;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Lock file response has no file content (type: {0})")]
    MissingContent(String),
    #[error("Unsupported content encoding: {0}")]
    Encoding(String),
    #[error("Invalid base64 content: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Lock file is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("Lock file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decoded `lock.json`. Every key is kept; only `branch` decides anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LockDescriptor {
    fields: Map<String, Value>,
}

impl LockDescriptor {
    /// Decode a fetched file: transport encoding, then UTF-8, then JSON.
    pub fn decode(file: &FileContent) -> Result<Self, DecodeError> {
        match file.encoding.as_deref() {
            None | Some("base64") => {}
            Some(other) => return Err(DecodeError::Encoding(other.to_string())),
        }

        let Some(content) = file.content.as_deref() else {
            let kind = file.kind.as_deref().unwrap_or("unknown");
            return Err(DecodeError::MissingContent(kind.to_string()));
        };

        // The contents API wraps base64 at 60 columns.
        let compact: String = content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = base64::engine::general_purpose::STANDARD.decode(compact)?;
        let text = String::from_utf8(bytes)?;
        Self::parse(&text)
    }

    /// Parse descriptor JSON. Valid JSON that is not an object still counts
    /// as a lock, just one without readable fields.
    pub fn parse(text: &str) -> Result<Self, DecodeError> {
        let fields = match serde_json::from_str::<Value>(text)? {
            Value::Object(fields) => fields,
            other => {
                tracing::debug!(kind = json_kind(&other), "lock descriptor is not an object");
                Map::new()
            }
        };
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Field rendered as text: strings as-is, other non-null values as JSON.
    pub fn get_text(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// The branch currently holding the lock.
    pub fn holder(&self) -> Option<String> {
        self.get_text("branch")
    }

    pub fn created_by(&self) -> Option<String> {
        self.get_text("created_by")
    }

    pub fn reason(&self) -> Option<String> {
        self.get_text("reason")
    }

    pub fn environment(&self) -> Option<String> {
        self.get_text("environment")
    }

    pub fn link(&self) -> Option<String> {
        self.get_text("link")
    }

    pub fn sticky(&self) -> Option<bool> {
        self.fields.get("sticky").and_then(Value::as_bool)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.fields.get("created_at")?.as_str()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Human-readable age of the lock, e.g. `2h 5m`.
    pub fn age_string(&self, now: DateTime<Utc>) -> Option<String> {
        let elapsed = now.signed_duration_since(self.created_at()?);
        let secs = elapsed.num_seconds().max(0);
        Some(if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m", secs / 60)
        } else if secs < 86400 {
            format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
        } else {
            format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn file(content: &str) -> FileContent {
        FileContent {
            path: "lock.json".to_string(),
            sha: String::new(),
            content: Some(content.to_string()),
            encoding: Some("base64".to_string()),
            kind: Some("file".to_string()),
        }
    }

    #[test]
    fn test_decode_wrapped_base64() {
        // base64 of {"branch":"feature-x"} split the way the API returns it
        let descriptor = LockDescriptor::decode(&file("eyJicmFuY2giOiJmZWF0\ndXJlLXgifQ==\n")).unwrap();
        assert_eq!(descriptor.holder().as_deref(), Some("feature-x"));
    }

    #[test]
    fn test_decode_rejects_other_encodings() {
        let mut f = file("");
        f.encoding = Some("none".to_string());
        assert!(matches!(
            LockDescriptor::decode(&f),
            Err(DecodeError::Encoding(_))
        ));
    }

    #[test]
    fn test_decode_without_content() {
        let listing = FileContent::from_payload("lock.json", r#"[{"type":"file"}]"#);
        let err = LockDescriptor::decode(&listing).unwrap_err();
        assert!(matches!(err, DecodeError::MissingContent(ref kind) if kind == "dir"));
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        // base64 of 0xff 0xfe
        assert!(matches!(
            LockDescriptor::decode(&file("//4=")),
            Err(DecodeError::Utf8(_))
        ));
    }

    #[test]
    fn test_empty_file_is_not_json() {
        assert!(matches!(
            LockDescriptor::decode(&file("")),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn test_unknown_keys_are_kept() {
        let descriptor = LockDescriptor::parse(r#"{"branch":"a","global":true,"extra":{"x":1}}"#).unwrap();
        assert_eq!(descriptor.fields().len(), 3);
        assert_eq!(descriptor.get("extra").unwrap()["x"], 1);
    }

    #[test]
    fn test_non_object_json_has_no_holder() {
        let descriptor = LockDescriptor::parse("[1, 2]").unwrap();
        assert!(descriptor.fields().is_empty());
        assert_eq!(descriptor.holder(), None);
    }

    #[test]
    fn test_holder_rendering() {
        assert_eq!(LockDescriptor::parse(r#"{"branch":null}"#).unwrap().holder(), None);
        assert_eq!(
            LockDescriptor::parse(r#"{"branch":42}"#).unwrap().holder().as_deref(),
            Some("42")
        );
    }

    #[test]
    fn test_metadata_fields() {
        let descriptor = LockDescriptor::parse(
            r#"{
                "reason": "hotfix",
                "branch": "fix-login",
                "created_at": "2024-03-01T10:00:00Z",
                "created_by": "octocat",
                "sticky": true,
                "environment": "production",
                "link": "https://example.com/pr/1"
            }"#,
        )
        .unwrap();

        assert_eq!(descriptor.reason().as_deref(), Some("hotfix"));
        assert_eq!(descriptor.created_by().as_deref(), Some("octocat"));
        assert_eq!(descriptor.environment().as_deref(), Some("production"));
        assert_eq!(descriptor.link().as_deref(), Some("https://example.com/pr/1"));
        assert_eq!(descriptor.sticky(), Some(true));

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 5, 0).unwrap();
        assert_eq!(descriptor.age_string(now).as_deref(), Some("2h 5m"));
    }

    #[test]
    fn test_bad_timestamp_has_no_age() {
        let descriptor = LockDescriptor::parse(r#"{"created_at":"yesterday"}"#).unwrap();
        assert_eq!(descriptor.created_at(), None);
        assert_eq!(descriptor.age_string(Utc::now()), None);
    }
}
