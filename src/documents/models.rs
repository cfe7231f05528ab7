//! Document models and request payloads.

// Author: kelexine (https://github.com/kelexine)

use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MAX_TITLE_CHARS: usize = 200;

/// A stored text document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of a create request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDocument {
    pub title: String,
    pub content: String,
}

/// Body of an update request; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDocument {
    pub title: Option<String>,
    pub content: Option<String>,
}

fn check_title(title: &str) -> Result<()> {
    if title.is_empty() {
        return Err(AppError::InvalidRequest("Title must not be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::InvalidRequest(format!(
            "Title must not exceed {} characters",
            MAX_TITLE_CHARS
        )));
    }
    Ok(())
}

fn check_content(content: &str) -> Result<()> {
    if content.is_empty() {
        return Err(AppError::InvalidRequest("Content must not be empty".to_string()));
    }
    Ok(())
}

impl CreateDocument {
    /// Trim both fields and reject empty or oversized values.
    pub fn normalized(self) -> Result<Self> {
        let title = self.title.trim().to_string();
        let content = self.content.trim().to_string();
        check_title(&title)?;
        check_content(&content)?;
        Ok(Self { title, content })
    }
}

impl UpdateDocument {
    /// Trim present fields; at least one must be given.
    pub fn normalized(self) -> Result<Self> {
        if self.title.is_none() && self.content.is_none() {
            return Err(AppError::InvalidRequest(
                "At least one field (title or content) must be provided".to_string(),
            ));
        }
        let title = self.title.map(|t| t.trim().to_string());
        let content = self.content.map(|c| c.trim().to_string());
        if let Some(t) = &title {
            check_title(t)?;
        }
        if let Some(c) = &content {
            check_content(c)?;
        }
        Ok(Self { title, content })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_is_trimmed_and_checked() {
        let req = CreateDocument {
            title: "  Notes ".to_string(),
            content: " body\n".to_string(),
        }
        .normalized()
        .unwrap();
        assert_eq!(req.title, "Notes");
        assert_eq!(req.content, "body");

        let empty = CreateDocument {
            title: "   ".to_string(),
            content: "body".to_string(),
        };
        assert!(matches!(empty.normalized(), Err(AppError::InvalidRequest(_))));

        let long = CreateDocument {
            title: "x".repeat(201),
            content: "body".to_string(),
        };
        assert!(long.normalized().is_err());
    }

    #[test]
    fn test_update_requires_a_field() {
        assert!(UpdateDocument::default().normalized().is_err());
        let ok = UpdateDocument {
            title: None,
            content: Some(" new ".to_string()),
        }
        .normalized()
        .unwrap();
        assert_eq!(ok.content.as_deref(), Some("new"));
    }
}
