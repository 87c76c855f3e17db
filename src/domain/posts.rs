//! Post records and the rules for drafting and mutating them.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::{error::DomainError, identity::Identity};

/// Identifier of a post; serialized as a bare JSON number (milliseconds since the epoch at creation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub u64);

impl PostId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PostId {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .trim()
            .parse::<u64>()
            .map(PostId)
            .map_err(|err| DomainError::validation("id", err.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    General,
    Announcement,
    Question,
    Idea,
}

/// Display metadata attached to each category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryMeta {
    pub label: &'static str,
    pub emoji: &'static str,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::General,
        Category::Announcement,
        Category::Question,
        Category::Idea,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::General => "general",
            Category::Announcement => "announcement",
            Category::Question => "question",
            Category::Idea => "idea",
        }
    }

    pub fn meta(self) -> CategoryMeta {
        match self {
            Category::General => CategoryMeta {
                label: "general",
                emoji: "\u{1F4AC}",
            },
            Category::Announcement => CategoryMeta {
                label: "announcement",
                emoji: "\u{1F4E2}",
            },
            Category::Question => CategoryMeta {
                label: "question",
                emoji: "\u{2753}",
            },
            Category::Idea => CategoryMeta {
                label: "idea",
                emoji: "\u{1F4A1}",
            },
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| DomainError::validation("category", format!("unknown category `{needle}`")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub author: String,
    pub author_initial: String,
    #[serde(rename = "timestamp", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(rename = "likes")]
    pub like_count: u32,
    #[serde(rename = "comments")]
    pub comment_count: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub liked: bool,
}

impl Post {
    /// Build a fresh post from a validated draft.
    pub fn from_draft(
        id: PostId,
        draft: &NewPost,
        author: &Identity,
        created_at: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        draft.validate()?;

        Ok(Self {
            id,
            title: draft.title.clone(),
            content: draft.content.clone(),
            category: draft.category,
            author: author.display_name().to_string(),
            author_initial: author.initial().to_string(),
            created_at,
            like_count: 0,
            comment_count: 0,
            tags: parse_tags(&draft.tags_raw),
            liked: false,
        })
    }

    /// Flip the shared `liked` flag, moving the count by exactly one in the matching direction.
    pub fn toggle_like(&mut self) {
        if self.liked {
            self.like_count = self.like_count.saturating_sub(1);
            self.liked = false;
        } else {
            self.like_count = self.like_count.saturating_add(1);
            self.liked = true;
        }
    }

    pub fn record_comment(&mut self) {
        self.comment_count = self.comment_count.saturating_add(1);
    }
}

/// Form input for a post before it has an id, author or timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category: Category,
    pub tags_raw: String,
}

impl NewPost {
    pub fn new(title: impl Into<String>, content: impl Into<String>, category: Category) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            category,
            tags_raw: String::new(),
        }
    }

    pub fn with_tags(mut self, tags_raw: impl Into<String>) -> Self {
        self.tags_raw = tags_raw.into();
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::required("title"));
        }
        if self.content.trim().is_empty() {
            return Err(DomainError::required("content"));
        }
        Ok(())
    }
}

/// Split a comma-separated tag list, trimming entries and dropping empty ones.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
