// Presentation layer: browser pages for the upload → compare → download flow.
// Rendering is plain server-side HTML; all logic lives in extract/ and rewrite/.

pub mod handlers;
pub mod render;

use serde::Serialize;

use crate::rewrite::sections::SectionMap;

/// Shown instead of running a rewrite when no API key is available.
pub const MISSING_CREDENTIAL_WARNING: &str = "Please enter your OpenAI API key to continue.";

/// One section as displayed: canonical title plus trimmed content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionView {
    pub title: String,
    pub content: String,
}

impl SectionView {
    /// All three sections in declaration order, trimmed for display.
    pub fn from_map(sections: &SectionMap) -> Vec<Self> {
        sections
            .iter()
            .map(|(section, content)| SectionView {
                title: section.title().to_string(),
                content: content.trim().to_string(),
            })
            .collect()
    }
}

/// Banner severity on rendered pages; serialises to the CSS class name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}
