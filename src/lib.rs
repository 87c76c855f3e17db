//! Client-side core of a shared message board.
//!
//! Posts live in memory inside [`application::store::PostStore`]. Every
//! mutation is applied immediately and then mirrored to a shared JSON
//! document and to a local cache that serves as the fallback when the shared
//! document cannot be reached.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
pub mod util;
