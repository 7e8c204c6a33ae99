use crate::core::importer::{BulkImporter, ImportRequest};
use crate::core::{DocumentStore, Storage};
use crate::domain::model::ImportSummary;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub enum SeedOutcome {
    Completed(ImportSummary),
    /// The source could not be read or was not a JSON array.
    Aborted { request: ImportRequest, error: String },
}

#[derive(Debug, Default)]
pub struct SeedReport {
    pub outcomes: Vec<SeedOutcome>,
    pub duration: Duration,
}

impl SeedReport {
    pub fn completed(&self) -> impl Iterator<Item = &ImportSummary> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            SeedOutcome::Completed(summary) => Some(summary),
            SeedOutcome::Aborted { .. } => None,
        })
    }

    pub fn aborted_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, SeedOutcome::Aborted { .. }))
            .count()
    }

    pub fn documents_written(&self) -> usize {
        self.completed().map(|summary| summary.succeeded).sum()
    }
}

/// Runs several imports one after another through a single importer.
pub struct SeedRunner<'a, S: Storage, D: DocumentStore> {
    importer: &'a BulkImporter<S, D>,
}

impl<'a, S: Storage, D: DocumentStore> SeedRunner<'a, S, D> {
    pub fn new(importer: &'a BulkImporter<S, D>) -> Self {
        Self { importer }
    }

    pub async fn run(&self, requests: &[ImportRequest]) -> SeedReport {
        let start = Instant::now();
        let mut report = SeedReport::default();

        tracing::info!("🚀 Starting seed run with {} imports", requests.len());

        for (i, request) in requests.iter().enumerate() {
            tracing::info!("[{}/{}] {}", i + 1, requests.len(), request.collection);
            match self.importer.import(request).await {
                Ok(summary) => report.outcomes.push(SeedOutcome::Completed(summary)),
                Err(e) => {
                    tracing::error!("❌ Import into '{}' aborted: {}", request.collection, e);
                    report.outcomes.push(SeedOutcome::Aborted {
                        request: request.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report.duration = start.elapsed();
        tracing::info!(
            "🎉 Seed run finished in {:?}: {} documents written, {} imports aborted",
            report.duration,
            report.documents_written(),
            report.aborted_count()
        );
        report
    }
}
