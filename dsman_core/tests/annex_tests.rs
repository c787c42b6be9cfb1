//! Integration tests for adding URLs to dataset files

use dsman_core::annex::{FilesDb, UrlStatus, files_db_path};
use dsman_core::{ActivityStats, AnnexInput, AnnexMode, Annexificator, Error};
use dsman_test_utils::{DatasetFixture, MockUrlProbe, MockVcs};
use std::sync::Arc;

const URL: &str = "http://example.com/data/1.dat";

async fn annexificator(
    fixture: &DatasetFixture,
    vcs: &MockVcs,
    probe: &MockUrlProbe,
    mode: AnnexMode,
) -> Annexificator {
    Annexificator::new(fixture.root(), Arc::new(vcs.clone()), Arc::new(probe.clone()))
        .await
        .unwrap()
        .with_mode(mode)
}

fn expected(update: impl FnOnce(&mut ActivityStats)) -> ActivityStats {
    let mut stats = ActivityStats {
        files: 1,
        urls: 1,
        ..Default::default()
    };
    update(&mut stats);
    stats
}

#[tokio::test]
async fn test_new_url_is_downloaded_into_annex() {
    let fixture = DatasetFixture::single();
    let vcs = MockVcs::new();
    let probe = MockUrlProbe::new();
    probe.set(URL, 1024, "1500000000");
    let mut annex = annexificator(&fixture, &vcs, &probe, AnnexMode::Full).await;

    let output = annex
        .process(AnnexInput::new(URL, "d1/1.dat"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        output.stats.without_time(),
        expected(|stats| {
            stats.downloaded = 1;
            stats.downloaded_size = 1024;
            stats.add_annex = 1;
        })
    );
    assert!(fixture.path("d1/1.dat").is_file());
    assert!(files_db_path(&fixture.root()).is_file());

    let calls = vcs.calls_of("annex_addurl");
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains("d1/1.dat"));
}

#[tokio::test]
async fn test_unchanged_url_is_skipped() {
    let fixture = DatasetFixture::single();
    let vcs = MockVcs::new();
    let probe = MockUrlProbe::new();
    probe.set(URL, 1024, "1500000000");
    let mut annex = annexificator(&fixture, &vcs, &probe, AnnexMode::Full).await;

    annex.process(AnnexInput::new(URL, "1.dat")).await.unwrap();
    let second = annex.process(AnnexInput::new(URL, "1.dat")).await.unwrap();
    assert!(second.is_none());
    assert_eq!(vcs.calls_of("annex_addurl").len(), 1);

    annex.set_yield_non_updated(true);
    let third = annex
        .process(AnnexInput::new(URL, "1.dat"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(third.stats, expected(|stats| stats.skipped = 1));
}

#[tokio::test]
async fn test_changed_url_overwrites_file() {
    let fixture = DatasetFixture::single();
    let vcs = MockVcs::new();
    let probe = MockUrlProbe::new();
    probe.set(URL, 1024, "1500000000");
    let mut annex = annexificator(&fixture, &vcs, &probe, AnnexMode::Full).await;
    annex.process(AnnexInput::new(URL, "1.dat")).await.unwrap();

    probe.set(URL, 2048, "1600000000");
    let output = annex
        .process(AnnexInput::new(URL, "1.dat"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        output.stats.without_time(),
        expected(|stats| {
            stats.overwritten = 1;
            stats.downloaded = 1;
            stats.downloaded_size = 2048;
            stats.add_annex = 1;
        })
    );
    assert_eq!(vcs.calls_of("annex_addurl").len(), 2);
}

#[tokio::test]
async fn test_relaxed_mode_ignores_changes() {
    let fixture = DatasetFixture::single();
    let vcs = MockVcs::new();
    let probe = MockUrlProbe::new();
    probe.set(URL, 1024, "1500000000");
    let mut annex = annexificator(&fixture, &vcs, &probe, AnnexMode::Relaxed)
        .await
        .with_yield_non_updated(true);

    let first = annex
        .process(AnnexInput::new(URL, "1.dat"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.stats, expected(|stats| stats.add_annex = 1));

    probe.set(URL, 2048, "1600000000");
    let second = annex
        .process(AnnexInput::new(URL, "1.dat"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.stats, expected(|stats| stats.skipped = 1));
}

#[tokio::test]
async fn test_fast_mode_does_not_download() {
    let fixture = DatasetFixture::single();
    let vcs = MockVcs::new();
    let probe = MockUrlProbe::new();
    probe.set(URL, 1024, "1500000000");
    let mut annex = annexificator(&fixture, &vcs, &probe, AnnexMode::Fast).await;

    let output = annex
        .process(AnnexInput::new(URL, "1.dat"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(output.stats, expected(|stats| stats.add_annex = 1));
    assert!(vcs.calls_of("annex_addurl")[0].contains("fast"));
}

#[tokio::test]
async fn test_small_text_files_land_in_git() {
    let fixture = DatasetFixture::single();
    let vcs = MockVcs::new();
    vcs.store_in_git(".txt");
    let probe = MockUrlProbe::new();
    let url = "http://example.com/README.txt";
    probe.set(url, 10, "1500000000");
    let mut annex = annexificator(&fixture, &vcs, &probe, AnnexMode::Fast).await;

    let output = annex
        .process(AnnexInput::new(url, "README.txt"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(output.stats, expected(|stats| stats.add_git = 1));
}

#[tokio::test]
async fn test_statistics_accumulate_on_input() {
    let fixture = DatasetFixture::single();
    let vcs = MockVcs::new();
    let probe = MockUrlProbe::new();
    probe.set(URL, 1024, "1500000000");
    let mut annex = annexificator(&fixture, &vcs, &probe, AnnexMode::Fast).await;

    let carried = ActivityStats {
        files: 5,
        urls: 5,
        skipped: 2,
        ..Default::default()
    };
    let output = annex
        .process(AnnexInput::new(URL, "1.dat").with_stats(carried))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(output.stats.files, 6);
    assert_eq!(output.stats.urls, 6);
    assert_eq!(output.stats.skipped, 2);
    assert_eq!(output.stats.add_annex, 1);
}

#[tokio::test]
async fn test_database_survives_new_instance() {
    let fixture = DatasetFixture::single();
    let vcs = MockVcs::new();
    let probe = MockUrlProbe::new();
    probe.set(URL, 1024, "1500000000");

    let mut annex = annexificator(&fixture, &vcs, &probe, AnnexMode::Full).await;
    annex.process(AnnexInput::new(URL, "1.dat")).await.unwrap();
    drop(annex);

    let db = FilesDb::load(&fixture.root()).await.unwrap();
    assert_eq!(
        db.get("1.dat"),
        Some(&UrlStatus {
            size: Some(1024),
            mtime: Some("1500000000".to_string()),
        })
    );

    let mut annex = annexificator(&fixture, &vcs, &probe, AnnexMode::Full).await;
    let output = annex.process(AnnexInput::new(URL, "1.dat")).await.unwrap();
    assert!(output.is_none());
}

#[tokio::test]
async fn test_unreachable_url_is_an_error() {
    let fixture = DatasetFixture::single();
    let vcs = MockVcs::new();
    let probe = MockUrlProbe::new();
    let mut annex = annexificator(&fixture, &vcs, &probe, AnnexMode::Full).await;

    let result = annex
        .process(AnnexInput::new("http://example.com/missing", "x.dat"))
        .await;
    assert!(matches!(result, Err(Error::Remote(_))));
    assert!(vcs.calls_of("annex_addurl").is_empty());
}

#[tokio::test]
async fn test_filename_must_stay_inside_dataset() {
    let fixture = DatasetFixture::single();
    let vcs = MockVcs::new();
    let probe = MockUrlProbe::new();
    probe.set(URL, 1, "1");
    let mut annex = annexificator(&fixture, &vcs, &probe, AnnexMode::Full).await;

    let result = annex.process(AnnexInput::new(URL, "../escape.dat")).await;
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[tokio::test]
async fn test_requires_dataset() {
    let fixture = DatasetFixture::single();
    let result = Annexificator::new(
        fixture.outside().join("plain"),
        Arc::new(MockVcs::new()),
        Arc::new(MockUrlProbe::new()),
    )
    .await;
    assert!(matches!(result, Err(Error::Io(_))));
}

#[tokio::test]
async fn test_submodule_dataset_with_gitlink_file() {
    let fixture = DatasetFixture::single();
    let sub = fixture.outside().join("sub");
    std::fs::create_dir_all(&sub).unwrap();
    std::fs::write(sub.join(".git"), "gitdir: ../.git/modules/sub\n").unwrap();

    let vcs = MockVcs::new();
    let probe = MockUrlProbe::new();
    probe.set(URL, 1024, "1500000000");
    let mut annex = Annexificator::new(sub.clone(), Arc::new(vcs.clone()), Arc::new(probe.clone()))
        .await
        .unwrap();

    let output = annex
        .process(AnnexInput::new(URL, "1.dat"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(output.stats.downloaded, 1);
    assert!(files_db_path(&sub).is_file());
    assert!(sub.join(".git").is_file());
}
