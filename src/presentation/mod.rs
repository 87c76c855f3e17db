//! Terminal rendering of the feed.

pub mod views;
