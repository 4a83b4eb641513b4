use std::{collections::HashMap, path::Path};

use crate::play::TrackRelease;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Maps upload file extensions to the content type sent with the media body.
#[derive(Debug, Clone)]
pub struct MediaTypes {
    by_extension: HashMap<String, String>,
    fallback: String,
}

impl Default for MediaTypes {
    fn default() -> Self {
        Self::empty()
            .with_extension("aab", OCTET_STREAM)
            .with_extension("apk", OCTET_STREAM)
    }
}

impl MediaTypes {
    pub fn empty() -> Self {
        Self {
            by_extension: HashMap::new(),
            fallback: OCTET_STREAM.to_string(),
        }
    }

    pub fn with_extension(mut self, extension: &str, content_type: &str) -> Self {
        self.by_extension.insert(
            extension.trim_start_matches('.').to_ascii_lowercase(),
            content_type.to_string(),
        );
        self
    }

    pub fn with_fallback(mut self, content_type: &str) -> Self {
        self.fallback = content_type.to_string();
        self
    }

    pub fn content_type_for(&self, path: &Path) -> &str {
        path.extension()
            .and_then(|s| s.to_str())
            .and_then(|ext| self.by_extension.get(&ext.to_ascii_lowercase()))
            .unwrap_or(&self.fallback)
    }
}

/// Renders a release list as `[name (codes) status, ...]` for progress output.
pub fn format_releases(releases: &[TrackRelease]) -> String {
    let items: Vec<String> = releases.iter().map(|r| r.to_string()).collect();
    format!("[{}]", items.join(", "))
}
