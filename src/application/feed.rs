//! Read-only projection of the post sequence into the list shown to the user.

use std::{cmp::Ordering, fmt, str::FromStr};

use crate::domain::{
    error::DomainError,
    posts::{Category, Post},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(self, post: &Post) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => post.category == category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Only(category) => category.fmt(f),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        value.parse().map(CategoryFilter::Only)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    MostLiked,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::MostLiked => "most-liked",
        }
    }

    /// Ordering used with a stable sort; equal keys keep their prior relative order.
    pub fn compare(self, left: &Post, right: &Post) -> Ordering {
        match self {
            SortOrder::Newest => right.created_at.cmp(&left.created_at),
            SortOrder::Oldest => left.created_at.cmp(&right.created_at),
            SortOrder::MostLiked => right.like_count.cmp(&left.like_count),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "most-liked" | "most_liked" | "mostliked" | "popular" => Ok(SortOrder::MostLiked),
            other => Err(DomainError::validation(
                "sort",
                format!("unknown sort order `{other}`"),
            )),
        }
    }
}

/// Active filter and sort chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeedState {
    pub filter: CategoryFilter,
    pub sort: SortOrder,
}

impl FeedState {
    pub fn new(filter: CategoryFilter, sort: SortOrder) -> Self {
        Self { filter, sort }
    }

    pub fn project<'a>(&self, posts: &'a [Post]) -> Vec<&'a Post> {
        project(posts, self.filter, self.sort)
    }
}

/// Filter by category, then order by `sort`. The input is never reordered.
pub fn project(posts: &[Post], filter: CategoryFilter, sort: SortOrder) -> Vec<&Post> {
    let mut visible: Vec<&Post> = posts.iter().filter(|post| filter.matches(post)).collect();
    visible.sort_by(|left, right| sort.compare(left, right));
    visible
}
