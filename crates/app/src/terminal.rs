//! Plain-text rendering and the stdin practice loop.

use services::overview::{HomeOverview, PackRow};
use services::{PracticeService, PracticeSession, SessionError, SyncStatus};
use storage::catalog::CatalogLoadError;
use tenses_core::model::{Pack, TenseInfo};
use tokio::io::{AsyncBufReadExt, BufReader};

/// `sync` is `None` when no remote store is configured.
pub fn print_home(home: &HomeOverview, sync: Option<SyncStatus>) {
    println!("Sync: {}", sync.map_or("local only", SyncStatus::label));
    println!("Review all mistakes: {}", home.total_mistakes);

    if !home.recent.is_empty() {
        println!();
        println!("Recently completed");
        for row in &home.recent {
            println!(
                "  {} · {} · {}%  ({})",
                row.tense_name, row.level_name, row.accuracy_percent, row.id
            );
        }
    }

    for category in &home.categories {
        println!();
        if category.mistakes > 0 {
            println!("{}  (review {} mistakes)", category.name, category.mistakes);
        } else {
            println!("{}", category.name);
        }
        for row in &category.packs {
            println!("  {}", pack_line(row));
        }
    }
}

fn pack_line(row: &PackRow) -> String {
    let progress = match row.band {
        Some(band) => format!("{}% {}", row.accuracy_percent, band.label()),
        None => "-".to_string(),
    };
    let mistakes = if row.mistakes > 0 {
        format!("  {} to review", row.mistakes)
    } else {
        String::new()
    };
    format!(
        "{:<28} {:<10} {:>3} sentences  {:<12} {}{}",
        row.tense_name, row.level_name, row.sentence_count, progress, row.id, mistakes
    )
}

pub fn print_tense_info<'a>(info: &TenseInfo, packs: impl Iterator<Item = &'a Pack>) {
    if info.native_name.is_empty() {
        println!("{}", info.name);
    } else {
        println!("{} ({})", info.name, info.native_name);
    }
    if !info.formula.is_empty() {
        println!("  Formula: {}", info.formula);
    }
    if !info.explanation.is_empty() {
        println!("  {}", info.explanation);
    }

    if !info.when_to_use.is_empty() {
        println!();
        println!("When to use");
        for case in &info.when_to_use {
            println!("  - {case}");
        }
    }
    if !info.examples.is_empty() {
        println!();
        println!("Examples");
        for example in &info.examples {
            println!("  {}", example.prompt);
            println!("    = {}", example.answer);
        }
    }

    println!();
    println!("Packs");
    for pack in packs {
        println!("  {:<28} {} ({} sentences)", pack.id().as_str(), pack.title(), pack.len());
    }
}

pub fn print_catalog_error(err: &CatalogLoadError) {
    tracing::error!(error = %err, "catalog failed to load");
    println!("Error loading data.");
    println!("  {err}");
}

fn print_current(session: &PracticeSession) {
    let Some(item) = session.current_item() else {
        return;
    };
    let progress = session.progress();
    println!();
    println!("[{}/{}] {}", progress.answered + 1, progress.total, item.label);
    println!("  {}", item.prompt);
    if session.is_revealed() {
        println!("  = {}", item.answer);
        println!("  correct? (y/n, h to hide)");
    } else {
        println!("  (Enter to reveal, q to quit)");
    }
}

/// Drive `session` from stdin until it ends or the learner quits.
pub async fn run_session(practice: &PracticeService, mut session: PracticeSession) -> anyhow::Result<()> {
    println!("{} · {} items", session.mode(), session.total_items());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while !session.is_complete() {
        print_current(&session);
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "" => session.reveal()?,
            "h" => session.hide()?,
            answer @ ("y" | "n") => match practice.judge(&mut session, answer == "y").await {
                Ok(result) => {
                    if let Some(outcome) = result.outcome {
                        println!();
                        println!(
                            "Done: {}/{} correct ({}%)",
                            outcome.correct, outcome.total, outcome.accuracy_percent
                        );
                    }
                }
                Err(SessionError::InvalidTransition { .. }) => {
                    println!("  reveal the answer first");
                }
                Err(err) => return Err(err.into()),
            },
            "q" => {
                println!("Stopped; attempts so far are saved.");
                break;
            }
            other => println!("  unknown input: {other}"),
        }
    }
    Ok(())
}
