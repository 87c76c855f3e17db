use std::fmt;

use time::OffsetDateTime;

use crate::application::feed::FeedState;
use crate::domain::posts::Post;
use crate::util::time_ago::time_ago;

pub const EMPTY_FEED_TITLE: &str = "Welcome to the board!";
pub const EMPTY_FEED_HINT: &str = "No messages yet. Be the first to share something.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagBadge {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCard {
    pub id: String,
    pub avatar: String,
    pub author: String,
    pub posted: String,
    pub badge: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<TagBadge>,
    pub likes: u32,
    pub comments: u32,
    pub liked: bool,
}

impl PostCard {
    pub fn from_post(post: &Post, now: OffsetDateTime) -> Self {
        let meta = post.category.meta();
        Self {
            id: post.id.to_string(),
            avatar: post.author_initial.clone(),
            author: post.author.clone(),
            posted: time_ago(post.created_at, now),
            badge: format!("{} {}", meta.emoji, meta.label),
            title: post.title.clone(),
            content: post.content.clone(),
            tags: build_tag_badges(post.tags.iter().map(String::as_str)),
            likes: post.like_count,
            comments: post.comment_count,
            liked: post.liked,
        }
    }
}

impl fmt::Display for PostCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "[{}] {} · {} · {}",
            self.avatar, self.author, self.posted, self.badge
        )?;
        writeln!(f, "  {}", self.title)?;
        for line in self.content.lines() {
            writeln!(f, "  {line}")?;
        }
        if !self.tags.is_empty() {
            let labels: Vec<&str> = self.tags.iter().map(|tag| tag.label.as_str()).collect();
            writeln!(f, "  {}", labels.join(" "))?;
        }
        let heart = if self.liked { "♥" } else { "♡" };
        write!(
            f,
            "  {heart} {}  💬 {}  (id {})",
            self.likes, self.comments, self.id
        )
    }
}

/// What the feed command prints: the projected cards plus the active filter and sort.
#[derive(Debug, Clone)]
pub struct FeedView {
    pub state: FeedState,
    pub cards: Vec<PostCard>,
    pub total_count: usize,
}

impl FeedView {
    pub fn new(state: FeedState, visible: &[&Post], total_count: usize, now: OffsetDateTime) -> Self {
        Self {
            state,
            cards: visible
                .iter()
                .map(|post| PostCard::from_post(post, now))
                .collect(),
            total_count,
        }
    }

    pub fn has_results(&self) -> bool {
        !self.cards.is_empty()
    }
}

impl fmt::Display for FeedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Showing {} of {} messages (category: {}, sort: {})",
            self.cards.len(),
            self.total_count,
            self.state.filter,
            self.state.sort
        )?;

        if !self.has_results() {
            writeln!(f)?;
            writeln!(f, "{EMPTY_FEED_TITLE}")?;
            return write!(f, "{EMPTY_FEED_HINT}");
        }

        for card in &self.cards {
            writeln!(f)?;
            writeln!(f, "{card}")?;
        }
        Ok(())
    }
}

pub fn build_tag_badges<'a, T>(tags: T) -> Vec<TagBadge>
where
    T: IntoIterator<Item = &'a str>,
{
    tags.into_iter()
        .map(|value| TagBadge {
            value: value.to_string(),
            label: format!("#{value}"),
        })
        .collect()
}
