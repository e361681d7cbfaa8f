use std::collections::BTreeMap;
use std::sync::Arc;

use services::{AppServices, SessionError, SessionState};
use tenses_core::model::{
    Catalog, Category, PackFile, PackId, Sentence, TenseFile, TenseId, TenseInfo,
};
use tenses_core::time::{fixed_clock, fixed_now};

fn catalog() -> Arc<Catalog> {
    let sentences = |n: usize| {
        (0..n)
            .map(|i| Sentence {
                prompt: format!("prompt {i}"),
                answer: format!("answer {i}"),
            })
            .collect()
    };
    let mut info = BTreeMap::new();
    info.insert(
        TenseId::new("present-simple"),
        TenseInfo {
            name: "Present Simple".into(),
            ..TenseInfo::default()
        },
    );
    let files = vec![TenseFile {
        tense: TenseId::new("present-simple"),
        packs: vec![
            PackFile {
                id: PackId::new("present-simple-1"),
                level_name: "Level 1".into(),
                description: "Habits".into(),
                sentences: sentences(3),
            },
            PackFile {
                id: PackId::new("present-simple-2"),
                level_name: "Level 2".into(),
                description: "Facts".into(),
                sentences: sentences(2),
            },
        ],
    }];
    let categories = vec![Category::new(
        "Present Tenses",
        [TenseId::new("present-simple")],
    )];
    Arc::new(Catalog::new(categories, info, files).unwrap())
}

#[tokio::test]
async fn three_item_run_records_progress_and_completion() {
    let app = AppServices::in_memory(fixed_clock()).await;
    let catalog = catalog();
    let practice = app.practice(&catalog).with_shuffle(false);
    let pack = PackId::new("present-simple-1");

    let mut session = practice.start_pack(pack.clone()).await.unwrap();
    assert_eq!(session.total_items(), 3);

    let mut outcome = None;
    for correct in [false, true, false] {
        assert_eq!(session.state(), SessionState::Presenting);
        session.reveal().unwrap();
        let result = practice.judge(&mut session, correct).await.unwrap();
        outcome = result.outcome;
    }

    assert_eq!(session.state(), SessionState::Ended);
    let outcome = outcome.expect("last judgment reports the outcome");
    assert_eq!((outcome.correct, outcome.total), (1, 3));
    assert_eq!(outcome.accuracy_percent, 33);

    let snapshot = app.progress().snapshot().await;
    let entry = snapshot.pack_progress(&pack).unwrap();
    assert_eq!(entry.practiced(), 3);
    assert_eq!(entry.correct(), 1);
    assert_eq!(entry.wrong_sentences().iter().copied().collect::<Vec<_>>(), vec![0, 2]);
    assert_eq!(entry.last_practiced(), Some(fixed_now()));
    assert_eq!(snapshot.recently_completed(), &[pack]);
}

#[tokio::test]
async fn review_runs_clear_mistakes_without_touching_recent_list() {
    let app = AppServices::in_memory(fixed_clock()).await;
    let catalog = catalog();
    let practice = app.practice(&catalog).with_shuffle(false);
    let pack = PackId::new("present-simple-2");
    let progress = app.progress();
    progress.record_attempt(&pack, 1, false).await;

    let mut session = practice.review_category("Present Tenses").await.unwrap();
    assert_eq!(session.total_items(), 1);
    session.reveal().unwrap();
    let result = practice.judge(&mut session, true).await.unwrap();
    assert!(result.judgment.is_complete);
    assert_eq!(
        result.outcome.map(|o| o.run_id),
        Some(PackId::review_category())
    );

    let snapshot = progress.snapshot().await;
    assert!(snapshot.recently_completed().is_empty());
    assert_eq!(snapshot.pack_progress(&pack).unwrap().mistake_count(), 0);
}

#[tokio::test]
async fn empty_reviews_are_refused_before_start() {
    let app = AppServices::in_memory(fixed_clock()).await;
    let practice = app.practice(&catalog());

    assert!(matches!(practice.review_all().await, Err(SessionError::Empty)));
    assert!(matches!(
        practice.review_pack(PackId::new("present-simple-1")).await,
        Err(SessionError::Empty)
    ));
}

#[tokio::test]
async fn judging_before_reveal_leaves_progress_untouched() {
    let app = AppServices::in_memory(fixed_clock()).await;
    let catalog = catalog();
    let practice = app.practice(&catalog);

    let mut session = practice
        .start_pack(PackId::new("present-simple-2"))
        .await
        .unwrap();
    let err = practice.judge(&mut session, true).await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidTransition { .. }));
    assert!(app.progress().snapshot().await.pack_progress_map().is_empty());
}

#[tokio::test]
async fn overview_reflects_finished_run() {
    let app = AppServices::in_memory(fixed_clock()).await;
    let catalog = catalog();
    let practice = app.practice(&catalog).with_shuffle(false);

    let mut session = practice
        .start_pack(PackId::new("present-simple-2"))
        .await
        .unwrap();
    while !session.is_complete() {
        session.reveal().unwrap();
        practice.judge(&mut session, true).await.unwrap();
    }

    let home = app.overview(&catalog).home().await;
    assert_eq!(home.total_mistakes, 0);
    assert_eq!(home.recent.len(), 1);
    assert_eq!(home.recent[0].accuracy_percent, 100);
    assert_eq!(home.categories[0].packs.len(), 2);
}
