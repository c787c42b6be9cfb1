//! Integration tests for dataset creation

use dsman_core::dataset::{dataset_config_path, is_dataset};
use dsman_core::{CreateOrchestrator, CreateRequest, DatasetTree, Error, Status};
use dsman_test_utils::{DatasetFixture, MockVcs};
use std::sync::Arc;

fn orchestrator(vcs: &MockVcs) -> CreateOrchestrator {
    CreateOrchestrator::new(Arc::new(vcs.clone()))
}

#[tokio::test]
async fn test_create_standalone_dataset() {
    let fixture = DatasetFixture::single();
    let path = fixture.outside().join("fresh");
    let vcs = MockVcs::new();

    let mut request = CreateRequest::new(&path);
    request.description = Some("workstation".to_string());
    let record = orchestrator(&vcs).create(&request).await.unwrap();

    assert_eq!(record.action, "create");
    assert_eq!(record.status, Status::Ok);
    assert_eq!(record.path, path);
    assert!(is_dataset(&path));
    assert!(dataset_config_path(&path).is_file());
    assert_eq!(vcs.calls_of("annex_init").len(), 1);
    assert_eq!(vcs.calls_of("commit_all").len(), 1);
    assert!(vcs.calls_of("submodule_add").is_empty());
}

#[tokio::test]
async fn test_create_without_annex() {
    let fixture = DatasetFixture::single();
    let vcs = MockVcs::new();

    let mut request = CreateRequest::new(fixture.outside().join("plain"));
    request.no_annex = true;
    let record = orchestrator(&vcs).create(&request).await.unwrap();

    assert_eq!(record.status, Status::Ok);
    assert!(vcs.calls_of("annex_init").is_empty());
}

#[tokio::test]
async fn test_create_registers_in_dataset() {
    let fixture = DatasetFixture::single();
    let vcs = MockVcs::new();

    let mut request = CreateRequest::new("inputs/raw");
    request.dataset = Some(fixture.root());
    let record = orchestrator(&vcs).create(&request).await.unwrap();

    assert_eq!(record.status, Status::Ok);
    assert_eq!(record.path, fixture.path("inputs/raw"));
    assert_eq!(record.refds.as_deref(), Some(fixture.root().as_path()));

    let submodules = vcs.calls_of("submodule_add");
    assert_eq!(submodules.len(), 1);
    assert!(submodules[0].ends_with("inputs/raw ./inputs/raw"));

    // The new dataset shows up in the hierarchy
    let tree = DatasetTree::discover(&fixture.root()).unwrap();
    assert_eq!(tree.len(), 2);
    assert!(tree.find(&fixture.path("inputs/raw")).is_some());
}

#[tokio::test]
async fn test_existing_dataset_is_an_error() {
    let fixture = DatasetFixture::nested_collections();
    let vcs = MockVcs::new();

    let mut request = CreateRequest::new("collection2");
    request.dataset = Some(fixture.root());
    let record = orchestrator(&vcs).create(&request).await.unwrap();

    assert_eq!(record.status, Status::Error);
    assert!(
        record
            .message
            .as_deref()
            .unwrap()
            .starts_with("dataset already exists")
    );
    assert!(vcs.calls().iter().all(|call| !call.starts_with("init ")));
}

#[tokio::test]
async fn test_non_empty_directory_is_refused() {
    let fixture = DatasetFixture::single();
    fixture.write_file("data/readme.txt", "occupied");
    let vcs = MockVcs::new();

    let mut request = CreateRequest::new("data");
    request.dataset = Some(fixture.root());
    let record = orchestrator(&vcs).create(&request).await.unwrap();

    assert_eq!(record.status, Status::Error);
    assert!(vcs.calls_of("init").is_empty());
}

#[tokio::test]
async fn test_path_outside_dataset_is_refused() {
    let fixture = DatasetFixture::single();
    let vcs = MockVcs::new();

    let mut request = CreateRequest::new(fixture.outside().join("elsewhere"));
    request.dataset = Some(fixture.root());
    let record = orchestrator(&vcs).create(&request).await.unwrap();

    assert_eq!(record.status, Status::Error);
    assert!(record.message.as_deref().unwrap().contains("is not inside dataset"));
}

#[tokio::test]
async fn test_failing_annex_init_is_reported() {
    let fixture = DatasetFixture::single();
    let vcs = MockVcs::new();
    vcs.fail_operation("annex_init");

    let record = orchestrator(&vcs)
        .create(&CreateRequest::new(fixture.outside().join("broken")))
        .await
        .unwrap();

    assert_eq!(record.status, Status::Error);
    assert!(
        record
            .message
            .as_deref()
            .unwrap()
            .starts_with("Cannot create dataset")
    );
}

#[tokio::test]
async fn test_dataset_must_be_installed() {
    let fixture = DatasetFixture::single();
    let mut request = CreateRequest::new("sub");
    request.dataset = Some(fixture.outside().join("missing"));

    let result = orchestrator(&MockVcs::new()).create(&request).await;
    assert!(matches!(result, Err(Error::Io(_))));
}
