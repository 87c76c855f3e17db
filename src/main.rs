use std::{
    io::{self, BufRead, Write},
    process,
};

use corkboard::{
    application::{
        error::AppError,
        feed::FeedState,
        session::{Session, SignupForm},
        store::{ClearConfirmation, PostStore},
    },
    config::{self, AuthArgs, ClearArgs, Command, CommentArgs, FeedArgs, LikeArgs, PostArgs},
    domain::{error::DomainError, posts::NewPost},
    infra::{self, telemetry},
    presentation::views::{FeedView, PostCard},
};
use time::OffsetDateTime;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    eprintln!("error: {}", error.presentation_message());

    let report = error.report();
    if dispatcher::has_been_set() {
        error!(error = %error, chain = ?report.messages, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, chain = ?report.messages, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    let command = cli_args
        .command
        .unwrap_or(Command::Feed(FeedArgs::default()));

    telemetry::init(&settings.logging)?;

    let mut store = infra::build_post_store(&settings)?;
    store.initialize().await;
    let mut session = Session::new(settings.auth.clone());

    let outcome = match command {
        Command::Feed(args) => {
            print_feed(&store, FeedState::new(args.category, args.sort));
            Ok(())
        }
        Command::Post(args) => run_post(&mut store, &mut session, args),
        Command::Like(args) => run_like(&mut store, args),
        Command::Comment(args) => run_comment(&mut store, args),
        Command::Clear(args) => run_clear(&mut store, args),
    };

    let reports = store.flush().await;
    info!(saves = reports.len(), "Pending saves settled");
    if settings.remote.enabled && reports.iter().any(|report| !report.remote_saved) {
        eprintln!("note: the shared board could not be reached; changes were kept locally");
    }
    if settings.cache.enabled && reports.iter().any(|report| !report.cache_saved) {
        eprintln!("note: the local cache could not be written");
    }

    outcome
}

fn run_post(store: &mut PostStore, session: &mut Session, args: PostArgs) -> Result<(), AppError> {
    sign_in(session, &args.auth)?;

    let mut draft = NewPost::new(args.title, args.content, args.category);
    if let Some(tags) = args.tags {
        draft = draft.with_tags(tags);
    }

    let post = store.create_post(&draft, &session.author())?;
    println!("Posted:");
    println!("{}", PostCard::from_post(&post, OffsetDateTime::now_utc()));
    println!();
    print_feed(store, FeedState::default());
    Ok(())
}

fn sign_in(session: &mut Session, auth: &AuthArgs) -> Result<(), AppError> {
    let password = auth.password.as_deref().unwrap_or_default();
    match (auth.username.as_deref(), auth.name.as_deref()) {
        (Some(username), _) => {
            let identity = session.login(username, password)?;
            info!(author = identity.display_name(), "Signed in");
        }
        (None, Some(name)) => {
            let identity = session.signup(&SignupForm {
                name,
                email: auth.email.as_deref().unwrap_or_default(),
                password,
                confirm_password: auth.confirm_password.as_deref().unwrap_or_default(),
            })?;
            info!(author = identity.display_name(), "Signed up");
        }
        (None, None) => {}
    }
    Ok(())
}

fn run_like(store: &mut PostStore, args: LikeArgs) -> Result<(), AppError> {
    let post = store.toggle_like(args.id)?;
    println!("{}", PostCard::from_post(&post, OffsetDateTime::now_utc()));
    Ok(())
}

fn run_comment(store: &mut PostStore, args: CommentArgs) -> Result<(), AppError> {
    if args.text.trim().is_empty() {
        return Err(DomainError::required("comment").into());
    }
    let post = store.add_comment(args.id)?;
    println!("{}", PostCard::from_post(&post, OffsetDateTime::now_utc()));
    Ok(())
}

fn run_clear(store: &mut PostStore, args: ClearArgs) -> Result<(), AppError> {
    let answer = if args.yes {
        true
    } else {
        confirm("Delete every message for everyone? This cannot be undone. [y/N] ")
            .map_err(|err| AppError::unexpected(format!("failed to read confirmation: {err}")))?
    };

    match ClearConfirmation::granted(answer) {
        Some(confirmation) => {
            store.clear_all(confirmation);
            println!("All messages deleted.");
        }
        None => println!("Nothing deleted."),
    }
    Ok(())
}

fn confirm(prompt: &str) -> io::Result<bool> {
    let mut stdout = io::stdout();
    stdout.write_all(prompt.as_bytes())?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn print_feed(store: &PostStore, state: FeedState) {
    let visible = store.project(&state);
    let view = FeedView::new(state, &visible, store.len(), OffsetDateTime::now_utc());
    println!("{view}");
}
