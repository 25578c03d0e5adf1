//! Screen-capture search payloads.
//!
//! The capture service returns a list of content items; only items of kind
//! `OCR` carry the window name the analyzer looks at. Every field is optional
//! so that audio or UI items parse without error.

use serde::{Deserialize, Serialize};

pub const OCR_CONTENT_KIND: &str = "OCR";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OcrResult {
    #[serde(default)]
    pub data: Vec<ContentItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContentItem {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub content: ContentBody,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentBody {
    #[serde(default, alias = "window_name")]
    pub window_name: Option<String>,
    #[serde(default, alias = "app_name")]
    pub app_name: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, alias = "frame_id")]
    pub frame_id: Option<i64>,
}

impl ContentItem {
    pub fn ocr(window_name: &str) -> Self {
        Self {
            kind: OCR_CONTENT_KIND.to_string(),
            content: ContentBody {
                window_name: Some(window_name.to_string()),
                ..ContentBody::default()
            },
        }
    }

    pub fn is_ocr(&self) -> bool {
        self.kind.eq_ignore_ascii_case(OCR_CONTENT_KIND)
    }
}

impl OcrResult {
    pub fn ocr_items(&self) -> impl Iterator<Item = &ContentItem> {
        self.data.iter().filter(|item| item.is_ocr())
    }
}
