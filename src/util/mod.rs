pub(crate) mod lock;
pub mod time_ago;
