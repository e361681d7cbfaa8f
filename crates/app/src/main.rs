#![forbid(unsafe_code)]

mod terminal;

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use services::{AppConfig, AppServices, Clock, PracticeSession, User};
use storage::catalog::load_catalog;
use storage::rest::RestConfig;
use tenses_core::model::{Catalog, PackId, TenseId, UserId};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Tense drill: flashcard practice with synced progress",
    long_about = None
)]
struct Cli {
    /// SQLite database holding local progress.
    #[arg(long = "db", env = "TENSES_DB_URL", default_value = "sqlite://tenses.sqlite3")]
    db_url: String,

    /// Directory with tense-info.json and one <tense>.json per tense.
    #[arg(long, env = "TENSES_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Identity already signed in at startup.
    #[arg(long, env = "TENSES_USER_ID")]
    user: Option<String>,

    /// Base URL of the remote progress table.
    #[arg(long, env = "TENSES_REMOTE_URL")]
    remote_url: Option<String>,

    /// API key for the remote progress table.
    #[arg(long, env = "TENSES_REMOTE_KEY", hide_env_values = true)]
    remote_key: Option<String>,

    /// Access token of the signed-in user; the API key is sent as bearer otherwise.
    #[arg(long, env = "TENSES_REMOTE_TOKEN", hide_env_values = true)]
    remote_token: Option<String>,

    /// Quiet period before local changes are pushed to the remote.
    #[arg(long, default_value_t = 2000)]
    sync_debounce_ms: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show progress per category and recently completed packs.
    Home,
    /// Practice every sentence of one pack.
    Practice { pack: String },
    /// Explain a tense, e.g. "past-perfect", and list its packs.
    Info { tense: String },
    /// Review recorded mistakes.
    Review {
        #[command(subcommand)]
        target: ReviewTarget,
    },
}

#[derive(Subcommand, Debug)]
enum ReviewTarget {
    /// Mistakes of one pack.
    Pack { pack: String },
    /// Mistakes of every pack in a category, e.g. "Past Tenses".
    Category { name: String },
    /// Every recorded mistake.
    All,
}

impl Cli {
    fn remote_config(&self) -> anyhow::Result<Option<RestConfig>> {
        match (&self.remote_url, &self.remote_key) {
            (Some(url), Some(key)) => {
                let config = RestConfig::new(url, key.clone()).context("invalid remote settings")?;
                Ok(Some(match &self.remote_token {
                    Some(token) => config.with_access_token(token.clone()),
                    None => config,
                }))
            }
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!("remote sync needs both a URL and a key; staying local");
                Ok(None)
            }
            (None, None) => Ok(None),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TENSES_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let format = env::var("TENSES_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> anyhow::Result<()> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid --db value: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid --db value: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("cannot create {}", path.display()))?;
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let db_url = normalize_sqlite_url(&cli.db_url);
    prepare_sqlite_file(&db_url)?;

    let config = AppConfig {
        db_url,
        remote: cli.remote_config()?,
        debounce: Duration::from_millis(cli.sync_debounce_ms),
    };
    let app = AppServices::new_sqlite(&config, Clock::System)
        .await
        .context("cannot open progress storage")?;

    let user = match &cli.user {
        Some(raw) => Some(User::new(raw.parse::<UserId>()?)),
        None => None,
    };
    app.account().initial_session(user.as_ref()).await;

    let catalog = load_catalog(&cli.data_dir).map(Arc::new);
    let outcome = match cli.command.unwrap_or(Commands::Home) {
        Commands::Home => {
            match &catalog {
                Ok(catalog) => {
                    let home = app.overview(catalog).home().await;
                    let account = app.account();
                    let sync = account.is_remote_enabled().then(|| account.status());
                    terminal::print_home(&home, sync);
                }
                Err(err) => terminal::print_catalog_error(err),
            }
            Ok(())
        }
        command => match catalog {
            Ok(catalog) => drill(&app, &catalog, command).await,
            Err(err) => Err(anyhow::Error::new(err).context("cannot load practice content")),
        },
    };

    app.progress().flush_sync().await;
    outcome
}

fn show_tense(catalog: &Catalog, raw: &str) -> anyhow::Result<()> {
    let tense = raw.parse::<TenseId>()?;
    let info = catalog
        .tense_info(&tense)
        .with_context(|| format!("no tense named {tense}"))?;
    terminal::print_tense_info(info, catalog.packs_of(&tense));
    Ok(())
}

async fn drill(app: &AppServices, catalog: &Arc<Catalog>, command: Commands) -> anyhow::Result<()> {
    let practice = app.practice(catalog);
    let session: PracticeSession = match command {
        Commands::Info { tense } => return show_tense(catalog, &tense),
        Commands::Practice { pack } => practice.start_pack(pack.parse::<PackId>()?).await?,
        Commands::Review { target } => match target {
            ReviewTarget::Pack { pack } => practice.review_pack(pack.parse::<PackId>()?).await?,
            ReviewTarget::Category { name } => practice.review_category(&name).await?,
            ReviewTarget::All => practice.review_all().await?,
        },
        Commands::Home => return Ok(()),
    };
    terminal::run_session(&practice, session).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();
    run(cli).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_urls_become_absolute() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/p.sqlite3"),
            "sqlite:///tmp/p.sqlite3"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite:/var/p.sqlite3"),
            "sqlite:///var/p.sqlite3"
        );
        assert!(normalize_sqlite_url("p.sqlite3").ends_with("/p.sqlite3"));
    }

    #[test]
    fn cli_parses_review_commands() {
        let cli = Cli::try_parse_from(["app", "review", "category", "Past Tenses"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Review {
                target: ReviewTarget::Category { ref name }
            }) if name == "Past Tenses"
        ));
        assert_eq!(cli.sync_debounce_ms, 2000);
    }

    #[test]
    fn remote_token_is_optional() {
        let cli = Cli::try_parse_from([
            "app",
            "--remote-url",
            "https://example.test",
            "--remote-key",
            "anon",
            "--remote-token",
            "user-jwt",
            "info",
            "past-perfect",
        ])
        .unwrap();
        assert!(cli.remote_config().unwrap().is_some());
        assert!(matches!(cli.command, Some(Commands::Info { ref tense }) if tense == "past-perfect"));

        let key_only = Cli::try_parse_from(["app", "--remote-key", "anon"]).unwrap();
        assert!(key_only.remote_config().unwrap().is_none());
    }

    #[test]
    fn unknown_tense_is_an_error() {
        let data = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data");
        let catalog = load_catalog(&data).unwrap();
        assert!(show_tense(&catalog, "past-perfect").is_ok());
        assert!(show_tense(&catalog, "pluperfect").is_err());
    }

    #[test]
    fn prepare_rejects_foreign_urls() {
        assert!(prepare_sqlite_file("postgres://db").is_err());
    }
}
