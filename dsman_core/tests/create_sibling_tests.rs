//! Integration tests for sibling creation over dataset hierarchies
//!
//! Datasets live on disk (see `DatasetFixture`); git and GitLab are mocked.

use dsman_core::error::{ConfigError, ValidationError};
use dsman_core::sibling::SiteConfig;
use dsman_core::status::any_failed;
use dsman_core::{
    CreateSiblingOrchestrator, CreateSiblingRequest, Error, ExistingPolicy, GitLabConfig,
    ProjectAttributes, Status, StatusRecord,
};
use dsman_test_utils::mocks::created_attributes;
use dsman_test_utils::{DatasetFixture, MockGitLabSite, MockVcs, SiteBehavior, SiteCall};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

fn config_with(site: SiteConfig) -> GitLabConfig {
    let mut sites = BTreeMap::new();
    sites.insert("theone".to_string(), site);
    GitLabConfig {
        default_site: Some("theone".to_string()),
        sites,
    }
}

/// Site "theone" with project root "secret" and the default layout
fn config() -> GitLabConfig {
    config_with(SiteConfig {
        project: Some("secret".to_string()),
        ..Default::default()
    })
}

fn orchestrator(vcs: &MockVcs) -> CreateSiblingOrchestrator {
    CreateSiblingOrchestrator::new(Arc::new(vcs.clone()))
}

fn projects(records: &[StatusRecord]) -> Vec<&str> {
    records
        .iter()
        .filter_map(|record| record.project.as_deref())
        .collect()
}

#[cfg(test)]
mod planning_tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_layout_fails_before_any_site_call() {
        let fixture = DatasetFixture::nested_collections();
        let vcs = MockVcs::new();
        let site = MockGitLabSite::default();

        let mut request = CreateSiblingRequest::new(fixture.root());
        request.layout = Some("funny".to_string());
        let result = orchestrator(&vcs).run(&request, &config(), &site).await;

        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidLayout { .. }))
        ));
        assert_eq!(site.call_count(), 0);
        assert!(vcs.calls().is_empty());
    }

    #[tokio::test]
    async fn test_configured_unknown_layout_is_rejected() {
        let fixture = DatasetFixture::single();
        let config = config_with(SiteConfig {
            project: Some("secret".to_string()),
            layout: Some("funny".to_string()),
            ..Default::default()
        });

        let request = CreateSiblingRequest::new(fixture.root());
        let result = orchestrator(&MockVcs::new()).plan(&request, &config);
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidLayout { .. }))
        ));
    }

    #[tokio::test]
    async fn test_missing_site_is_reported() {
        let fixture = DatasetFixture::single();
        let request = CreateSiblingRequest::new(fixture.root());

        let result = orchestrator(&MockVcs::new()).plan(&request, &GitLabConfig::default());
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::MissingSite { .. }))
        ));
    }

    #[tokio::test]
    async fn test_project_and_recursive_are_exclusive() {
        let fixture = DatasetFixture::nested_collections();
        let mut request = CreateSiblingRequest::new(fixture.root());
        request.project = Some("mine".to_string());
        request.recursive = true;

        let result = orchestrator(&MockVcs::new()).plan(&request, &config());
        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::MutuallyExclusive { .. }))
        ));
        assert!(result.unwrap_err().is_usage_error());
    }

    #[tokio::test]
    async fn test_project_and_multiple_paths_are_exclusive() {
        let fixture = DatasetFixture::nested_collections();
        let mut request = CreateSiblingRequest::new(fixture.root());
        request.project = Some("mine".to_string());
        request.paths = vec![PathBuf::from("collection2"), PathBuf::from("subdir")];

        let result = orchestrator(&MockVcs::new()).plan(&request, &config());
        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::MutuallyExclusive { .. }))
        ));
    }

    #[tokio::test]
    async fn test_reference_dataset_must_exist() {
        let fixture = DatasetFixture::single();
        let request = CreateSiblingRequest::new(fixture.outside().join("nothing"));

        let result = orchestrator(&MockVcs::new()).plan(&request, &config());
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_plan_lists_datasets_in_processing_order() {
        let fixture = DatasetFixture::nested_collections();
        let mut request = CreateSiblingRequest::new(fixture.root());
        request.recursive = true;

        let plan = orchestrator(&MockVcs::new())
            .plan(&request, &config())
            .unwrap();
        let paths = plan.dataset_paths();
        assert_eq!(paths.len(), 7);
        assert_eq!(paths[0], fixture.root());
        assert_eq!(paths[1], fixture.path("collection2"));
        assert_eq!(paths[4], fixture.path("subdir/collection1"));
        assert_eq!(plan.settings().sibling_name, "theone");
    }
}

#[cfg(test)]
mod dry_run_tests {
    use super::*;

    async fn dry_run(layout: &str, paths: Vec<PathBuf>, recursive: bool) -> Vec<StatusRecord> {
        let fixture = DatasetFixture::nested_collections();
        let vcs = MockVcs::new();
        let mut request = CreateSiblingRequest::new(fixture.root());
        request.layout = Some(layout.to_string());
        request.paths = paths;
        request.recursive = recursive;
        request.dry_run = true;

        let orchestrator = orchestrator(&vcs);
        let plan = orchestrator.plan(&request, &config()).unwrap();
        orchestrator.execute(&plan, None).await.unwrap()
    }

    #[tokio::test]
    async fn test_root_dataset_uses_project_root() {
        for layout in ["hierarchy", "collection", "flat"] {
            let records = dry_run(layout, Vec::new(), false).await;
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].status, Status::Ok);
            assert_eq!(records[0].project.as_deref(), Some("secret"));
            assert_eq!(records[0].site.as_deref(), Some("theone"));
        }
    }

    #[tokio::test]
    async fn test_subdataset_per_layout() {
        let cases = [
            ("hierarchy", "secret/subdir/collection1/_repo_"),
            ("collection", "secret/subdir--collection1"),
            ("flat", "secret--subdir--collection1"),
        ];
        for (layout, expected) in cases {
            let records = dry_run(layout, vec![PathBuf::from("subdir")], false).await;
            assert_eq!(projects(&records), vec![expected], "layout {layout}");
        }
    }

    #[tokio::test]
    async fn test_recursive_collection_layout() {
        let records = dry_run("collection", Vec::new(), true).await;
        assert_eq!(
            projects(&records),
            vec![
                "secret",
                "secret/collection2",
                "secret/collection2--sub1",
                "secret/collection2--sub1--deepsub1",
                "secret/subdir--collection1",
                "secret/subdir--collection1--sub1",
                "secret/subdir--collection1--sub2",
            ]
        );
    }

    #[tokio::test]
    async fn test_recursive_from_subdataset() {
        let records = dry_run("flat", vec![PathBuf::from("collection2")], true).await;
        assert_eq!(
            projects(&records),
            vec![
                "secret--collection2",
                "secret--collection2--sub1",
                "secret--collection2--sub1--deepsub1",
            ]
        );
    }

    #[tokio::test]
    async fn test_execute_without_site_requires_dry_run() {
        let fixture = DatasetFixture::single();
        let orchestrator = orchestrator(&MockVcs::new());
        let plan = orchestrator
            .plan(&CreateSiblingRequest::new(fixture.root()), &config())
            .unwrap();

        let result = orchestrator.execute(&plan, None).await;
        assert!(matches!(result, Err(Error::Remote(_))));
    }
}

#[cfg(test)]
mod execution_tests {
    use super::*;

    #[tokio::test]
    async fn test_new_project_is_created_and_configured() {
        let fixture = DatasetFixture::single();
        let vcs = MockVcs::new();
        let site = MockGitLabSite::new(SiteBehavior::NewProject);

        let mut request = CreateSiblingRequest::new(fixture.root());
        request.description = Some("my dataset".to_string());
        let records = orchestrator(&vcs)
            .run(&request, &config(), &site)
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].action, "create_sibling_gitlab");
        assert_eq!(records[0].status, Status::Ok);
        assert_eq!(
            records[0].project_attributes,
            Some(created_attributes("secret").with_description(Some("my dataset".to_string())))
        );
        assert_eq!(
            records[0].message.as_deref(),
            Some("sibling repository 'theone' created at http://gitlab.example.com/secret.git")
        );

        assert_eq!(records[1].action, "configure-sibling");
        assert_eq!(records[1].status, Status::Ok);
        assert_eq!(records[1].name.as_deref(), Some("theone"));
        assert_eq!(
            records[1].url.as_deref(),
            Some("http://gitlab.example.com/secret.git")
        );

        assert_eq!(
            site.calls(),
            vec![
                SiteCall::GetProject("secret".to_string()),
                SiteCall::CreateProject {
                    path: "secret".to_string(),
                    description: Some("my dataset".to_string()),
                },
            ]
        );
        assert_eq!(
            vcs.remotes_of(&fixture.root()).get("theone").map(String::as_str),
            Some("http://gitlab.example.com/secret.git")
        );
        assert_eq!(
            vcs.config_value(&fixture.root(), "remote.theone.annex-ignore")
                .as_deref(),
            Some("true")
        );
    }

    #[tokio::test]
    async fn test_ssh_access_registers_ssh_url() {
        let fixture = DatasetFixture::single();
        let vcs = MockVcs::new();
        let site = MockGitLabSite::default();

        let mut request = CreateSiblingRequest::new(fixture.root());
        request.access = Some("ssh".to_string());
        let records = orchestrator(&vcs)
            .run(&request, &config(), &site)
            .await
            .unwrap();

        assert_eq!(
            records[1].url.as_deref(),
            Some("git@gitlab.example.com:secret.git")
        );
    }

    #[tokio::test]
    async fn test_explicit_project_is_used_verbatim() {
        let fixture = DatasetFixture::nested_collections();
        let vcs = MockVcs::new();
        let site = MockGitLabSite::default();

        let mut request = CreateSiblingRequest::new(fixture.root());
        request.paths = vec![PathBuf::from("collection2")];
        request.project = Some("mygroup/myproject".to_string());
        request.layout = Some("flat".to_string());
        let records = orchestrator(&vcs)
            .run(&request, &config(), &site)
            .await
            .unwrap();

        assert_eq!(site.created_projects(), vec!["mygroup/myproject"]);
        assert_eq!(records[0].path, fixture.path("collection2"));
        assert_eq!(records[0].project.as_deref(), Some("mygroup/myproject"));
    }

    #[tokio::test]
    async fn test_recursive_creates_every_project() {
        let fixture = DatasetFixture::nested_collections();
        let vcs = MockVcs::new();
        let site = MockGitLabSite::default();

        let mut request = CreateSiblingRequest::new(fixture.root());
        request.recursive = true;
        request.layout = Some("collection".to_string());
        let records = orchestrator(&vcs)
            .run(&request, &config(), &site)
            .await
            .unwrap();

        assert_eq!(records.len(), 14);
        assert!(!any_failed(&records));
        assert_eq!(site.created_projects().len(), 7);
        assert_eq!(site.created_projects()[3], "secret/collection2--sub1--deepsub1");
    }

    #[tokio::test]
    async fn test_missing_project_root_is_reported_per_dataset() {
        let fixture = DatasetFixture::nested_collections();
        let vcs = MockVcs::new();
        let site = MockGitLabSite::default();
        let config = config_with(SiteConfig::default());

        let mut request = CreateSiblingRequest::new(fixture.root());
        request.recursive = true;
        let records = orchestrator(&vcs)
            .run(&request, &config, &site)
            .await
            .unwrap();

        assert_eq!(records.len(), 7);
        for record in &records {
            assert_eq!(record.status, Status::Error);
            assert!(
                record
                    .message
                    .as_deref()
                    .unwrap()
                    .contains("gitlab.sites.theone.project")
            );
        }
        assert_eq!(site.call_count(), 0);
    }

    #[tokio::test]
    async fn test_create_failure_is_an_error_record() {
        let fixture = DatasetFixture::single();
        let vcs = MockVcs::new();
        let site = MockGitLabSite::new(SiteBehavior::CreateFailure("quota exceeded".to_string()));

        let records = orchestrator(&vcs)
            .run(&CreateSiblingRequest::new(fixture.root()), &config(), &site)
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, Status::Error);
        let message = records[0].message.as_deref().unwrap();
        assert!(message.starts_with("Failed to create GitLab project: "));
        assert!(message.contains("quota exceeded"));
        assert!(vcs.remotes_of(&fixture.root()).is_empty());
    }

    #[tokio::test]
    async fn test_one_failing_dataset_does_not_stop_the_batch() {
        let fixture = DatasetFixture::nested_collections();
        let vcs = MockVcs::new();
        vcs.preset_remote(&fixture.path("collection2"), "theone", "http://old.example.com");
        let site = MockGitLabSite::default();

        let mut request = CreateSiblingRequest::new(fixture.root());
        request.recursive = true;
        let records = orchestrator(&vcs)
            .run(&request, &config(), &site)
            .await
            .unwrap();

        let failed: Vec<_> = records
            .iter()
            .filter(|record| record.status == Status::Error)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].path, fixture.path("collection2"));
        assert_eq!(site.created_projects().len(), 6);
    }
}

#[cfg(test)]
mod existing_tests {
    use super::*;

    fn existing_attributes() -> ProjectAttributes {
        ProjectAttributes::new(
            "http://gitlab.example.com/secret.git",
            "git@gitlab.example.com:secret.git",
        )
    }

    async fn run_with(
        vcs: &MockVcs,
        site: &MockGitLabSite,
        fixture: &DatasetFixture,
        existing: ExistingPolicy,
    ) -> Vec<StatusRecord> {
        let mut request = CreateSiblingRequest::new(fixture.root());
        request.existing = existing;
        orchestrator(vcs)
            .run(&request, &config(), site)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_existing_remote_with_skip() {
        let fixture = DatasetFixture::single();
        let vcs = MockVcs::new();
        vcs.preset_remote(&fixture.root(), "theone", "http://old.example.com");
        let site = MockGitLabSite::default();

        let records = run_with(&vcs, &site, &fixture, ExistingPolicy::Skip).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, Status::NotNeeded);
        assert_eq!(
            records[0].message.as_deref(),
            Some("already has a configured sibling \"theone\"")
        );
        assert_eq!(site.call_count(), 0);
    }

    #[tokio::test]
    async fn test_existing_remote_with_error() {
        let fixture = DatasetFixture::single();
        let vcs = MockVcs::new();
        vcs.preset_remote(&fixture.root(), "theone", "http://old.example.com");
        let site = MockGitLabSite::default();

        let records = run_with(&vcs, &site, &fixture, ExistingPolicy::Error).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, Status::Error);
        assert_eq!(site.call_count(), 0);
        assert_eq!(
            vcs.remotes_of(&fixture.root()).get("theone").map(String::as_str),
            Some("http://old.example.com")
        );
    }

    #[tokio::test]
    async fn test_existing_project_without_reconfigure() {
        let fixture = DatasetFixture::single();
        let vcs = MockVcs::new();
        let site = MockGitLabSite::new(SiteBehavior::ExistingProject(existing_attributes()));

        let records = run_with(&vcs, &site, &fixture, ExistingPolicy::Error).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, Status::Error);
        assert_eq!(records[0].project_attributes, Some(existing_attributes()));
        assert_eq!(
            records[0].message.as_deref(),
            Some(
                "There is already a project at 'secret' on site 'theone', but no sibling with name 'theone' is configured, maybe use --existing=reconfigure"
            )
        );
        assert!(site.created_projects().is_empty());
    }

    #[tokio::test]
    async fn test_reconfigure_repoints_existing_remote() {
        let fixture = DatasetFixture::single();
        let vcs = MockVcs::new();
        vcs.preset_remote(&fixture.root(), "theone", "http://old.example.com");
        let site = MockGitLabSite::new(SiteBehavior::ExistingProject(existing_attributes()));

        let records = run_with(&vcs, &site, &fixture, ExistingPolicy::Reconfigure).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, "configure-sibling");
        assert_eq!(records[0].status, Status::Ok);
        assert!(site.created_projects().is_empty());
        assert_eq!(vcs.calls_of("set_remote_url").len(), 1);
        assert!(vcs.calls_of("add_remote").is_empty());
        assert_eq!(
            vcs.remotes_of(&fixture.root()).get("theone").map(String::as_str),
            Some("http://gitlab.example.com/secret.git")
        );
    }

    #[tokio::test]
    async fn test_reconfigure_without_remote_adds_it() {
        let fixture = DatasetFixture::single();
        let vcs = MockVcs::new();
        let site = MockGitLabSite::new(SiteBehavior::ExistingProject(existing_attributes()));

        let records = run_with(&vcs, &site, &fixture, ExistingPolicy::Reconfigure).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, "configure-sibling");
        assert_eq!(vcs.calls_of("add_remote").len(), 1);
    }

    #[tokio::test]
    async fn test_failing_remote_configuration_is_reported() {
        let fixture = DatasetFixture::single();
        let vcs = MockVcs::new();
        vcs.fail_operation("add_remote");
        let site = MockGitLabSite::default();

        let records = run_with(&vcs, &site, &fixture, ExistingPolicy::Error).await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, Status::Ok);
        assert_eq!(records[1].status, Status::Error);
        assert!(any_failed(&records));
    }
}
