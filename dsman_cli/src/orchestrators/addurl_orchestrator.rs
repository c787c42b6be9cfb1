//! addurl command orchestrator

use crate::config::AppConfig;
use anyhow::Result;
use dsman_core::annex::UrlProbe;
use dsman_core::status::RecordType;
use dsman_core::{AnnexInput, AnnexMode, Annexificator, HttpUrlProbe, Status, StatusRecord, Vcs};
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Action name of addurl records
pub const ACTION: &str = "addurl";

/// Options of one addurl invocation
#[derive(Debug, Clone, Default)]
pub struct AddUrlOptions {
    pub dataset: PathBuf,
    pub url: String,
    /// Target file, relative to the dataset
    pub file: PathBuf,
    /// Overrides `annex.mode`
    pub mode: Option<AnnexMode>,
    /// Extra `git annex addurl` options
    pub annex_options: Vec<String>,
}

/// Adds one URL to a dataset file and reports the outcome as a record
pub struct AddUrlOrchestrator {
    config: AppConfig,
    vcs: Arc<dyn Vcs>,
    probe: Option<Arc<dyn UrlProbe>>,
}

impl AddUrlOrchestrator {
    pub fn new(config: AppConfig, vcs: Arc<dyn Vcs>) -> Self {
        Self {
            config,
            vcs,
            probe: None,
        }
    }

    /// Use `probe` instead of probing over HTTP
    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn UrlProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    fn probe(&self) -> Result<Arc<dyn UrlProbe>> {
        match &self.probe {
            Some(probe) => Ok(Arc::clone(probe)),
            None => {
                let timeout = Duration::from_secs(self.config.network.timeout_seconds);
                Ok(Arc::new(HttpUrlProbe::new(timeout)?))
            }
        }
    }

    fn mode(&self, explicit: Option<AnnexMode>) -> Result<AnnexMode> {
        match explicit {
            Some(mode) => Ok(mode),
            None => Ok(self
                .config
                .annex
                .mode
                .parse()
                .map_err(dsman_core::Error::from)?),
        }
    }

    pub async fn run(&self, options: &AddUrlOptions) -> Result<StatusRecord> {
        let mode = self.mode(options.mode)?;
        debug!("Adding {} in {mode} mode", options.url);

        let mut annex = Annexificator::new(&options.dataset, Arc::clone(&self.vcs), self.probe()?)
            .await?
            .with_mode(mode)
            .with_options(options.annex_options.clone())
            .with_yield_non_updated(true);

        let output = annex
            .process(AnnexInput::new(&options.url, &options.file))
            .await?;

        Ok(record(&options.dataset, &options.file, &options.url, output))
    }
}

fn record(dataset: &Path, file: &Path, url: &str, output: Option<AnnexInput>) -> StatusRecord {
    let status = match &output {
        Some(input) if input.stats.skipped == 0 => Status::Ok,
        _ => Status::NotNeeded,
    };
    let mut record = StatusRecord::new(ACTION, dataset.join(file), status)
        .with_type(RecordType::File)
        .with_refds(dataset)
        .with_url(url);
    if let Some(input) = output {
        record = record.with_message(input.stats.to_string());
    }
    record
}
