use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use crate::{service::build_pipeline, settings::Settings};

/// Load every PDF under `data`, then chunk, embed and upsert it into the index.
///
/// With `recreate`, the collection is dropped first so stale chunks from
/// removed or edited files disappear.
pub async fn run_ingest(settings: &Settings, data: &Path, recreate: bool) -> anyhow::Result<()> {
    let pipeline = build_pipeline(settings).await.context("failed to set up ingestion pipeline")?;

    let report = medbot_rag::load_pdf_directory(data)
        .await
        .with_context(|| format!("failed to load PDFs from {}", data.display()))?;
    for failure in &report.failures {
        warn!(path = %failure.path.display(), error = %failure.message, "file skipped");
    }

    if recreate {
        pipeline.recreate_index().await.context("failed to recreate index")?;
    } else {
        pipeline.ensure_index().await.context("failed to create index")?;
    }

    let chunks = pipeline.ingest(&report.documents).await.context("ingestion failed")?;
    info!(
        index = pipeline.collection(),
        files = report.source_count(),
        pages = report.documents.len(),
        skipped = report.failures.len(),
        chunks = chunks.len(),
        "ingestion complete"
    );
    Ok(())
}
