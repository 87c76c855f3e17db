use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

use crate::application::feed::{CategoryFilter, SortOrder};
use crate::domain::posts::{Category, PostId};

/// Command-line arguments for the corkboard binary.
#[derive(Debug, Parser)]
#[command(name = "corkboard", version, about = "Shared message board client")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "CORKBOARD_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Toggle the shared remote document.
    #[arg(
        long = "remote-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub remote_enabled: Option<bool>,

    /// Override the remote document service base URL.
    #[arg(long = "remote-base-url", value_name = "URL", global = true)]
    pub remote_base_url: Option<String>,

    /// Override the directory holding the local cache.
    #[arg(
        long = "cache-directory",
        value_name = "PATH",
        value_hint = ValueHint::DirPath,
        global = true
    )]
    pub cache_directory: Option<PathBuf>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Show the feed.
    Feed(FeedArgs),
    /// Publish a new message.
    Post(PostArgs),
    /// Toggle the like on a message.
    Like(LikeArgs),
    /// Add a comment to a message.
    Comment(CommentArgs),
    /// Delete every message on the board.
    Clear(ClearArgs),
}

#[derive(Debug, Args, Clone, Default)]
pub struct FeedArgs {
    /// Category to show (all|general|announcement|question|idea).
    #[arg(long, value_name = "CATEGORY", default_value = "all")]
    pub category: CategoryFilter,

    /// Ordering (newest|oldest|popular).
    #[arg(long, value_name = "ORDER", default_value = "newest")]
    pub sort: SortOrder,
}

#[derive(Debug, Args, Clone)]
pub struct PostArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub content: String,

    #[arg(long, value_name = "CATEGORY", default_value = "general")]
    pub category: Category,

    /// Comma separated tags.
    #[arg(long, value_name = "TAGS")]
    pub tags: Option<String>,

    #[command(flatten)]
    pub auth: AuthArgs,
}

/// Sign in with `--username/--password`, or sign up with `--name/--email/--password/--confirm-password`.
/// Without either the message is posted as the guest.
#[derive(Debug, Args, Clone, Default)]
pub struct AuthArgs {
    #[arg(long, conflicts_with = "name")]
    pub username: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, requires = "name")]
    pub email: Option<String>,

    #[arg(long = "confirm-password", requires = "name")]
    pub confirm_password: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct LikeArgs {
    #[arg(value_name = "ID")]
    pub id: PostId,
}

#[derive(Debug, Args, Clone)]
pub struct CommentArgs {
    #[arg(value_name = "ID")]
    pub id: PostId,

    #[arg(value_name = "TEXT")]
    pub text: String,
}

#[derive(Debug, Args, Clone, Default)]
pub struct ClearArgs {
    /// Skip the interactive confirmation.
    #[arg(long, short = 'y')]
    pub yes: bool,
}
