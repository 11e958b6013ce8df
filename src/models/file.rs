use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};

/// Descriptor record for one stored file.
///
/// Exactly one of `inline_payload` or (`chunked` with `chunk_count`) is set.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub path: String,
    pub path_prefix: String,
    #[serde(default)]
    pub chunked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_payload: Option<String>,
}

impl FileRecord {
    /// `data:` URL for single-record files; `None` for chunked ones.
    pub fn data_url(&self) -> Option<String> {
        if self.chunked {
            return None;
        }
        self.inline_payload
            .as_deref()
            .map(|payload| data_url(&self.mime_type, payload))
    }
}

pub fn data_url(mime_type: &str, encoded: &str) -> String {
    format!("data:{};base64,{}", mime_type, encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inline_record() -> FileRecord {
        FileRecord {
            id: "1700000000000_abcdefghi".to_string(),
            name: "notes.txt".to_string(),
            size: 5,
            mime_type: "text/plain".to_string(),
            uploaded_at: "2024-01-02T03:04:05Z".parse().unwrap(),
            path: "docs/1700000000000_abcdefghi_notes.txt".to_string(),
            path_prefix: "docs".to_string(),
            chunked: false,
            chunk_count: None,
            inline_payload: Some("aGVsbG8=".to_string()),
        }
    }

    #[test]
    fn serializes_with_camel_case_fields_and_omits_absent_options() {
        let value = serde_json::to_value(inline_record()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "1700000000000_abcdefghi",
                "name": "notes.txt",
                "size": 5,
                "mimeType": "text/plain",
                "uploadedAt": "2024-01-02T03:04:05Z",
                "path": "docs/1700000000000_abcdefghi_notes.txt",
                "pathPrefix": "docs",
                "chunked": false,
                "inlinePayload": "aGVsbG8="
            })
        );
    }

    #[test]
    fn data_url_only_for_inline_records() {
        let mut record = inline_record();
        assert_eq!(record.data_url().as_deref(), Some("data:text/plain;base64,aGVsbG8="));

        record.chunked = true;
        record.chunk_count = Some(2);
        record.inline_payload = None;
        assert_eq!(record.data_url(), None);
    }
}
