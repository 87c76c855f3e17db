//! Application services: the post store, the feed projection and the session.

pub mod error;
pub mod feed;
pub mod repos;
pub mod session;
pub mod store;
