//! One export run: fetch, normalize, emit
//!
//! Only an unavailable feed, or failing to write every requested
//! artifact, fails the run. Skipped records, unknown sets, a missing
//! schema and schema violations are reported and logged.

use crate::config::ExportConfig;
use crate::core::ExportMetadata;
use crate::export::{
    BinaryEmitter, CardDatabaseDocument, Emitter, JsonEmitter, MarkupEmitter, SchemaViolation,
    XsdSchema,
};
use crate::loader::feed::fetch_schema;
use crate::loader::{load_feed, CardDatabase};
use crate::{ExportError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Violations logged individually before the rest are summarized
const MAX_LOGGED_VIOLATIONS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifact {
    pub path: PathBuf,
    pub format: &'static str,
    pub bytes: usize,
}

/// What became of markup validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    NotRequested,
    Passed,
    Failed(Vec<SchemaViolation>),
    /// Schema could not be fetched or parsed
    Skipped(String),
}

#[derive(Debug)]
pub struct ExportSummary {
    pub cards: usize,
    pub crypt: usize,
    pub library: usize,
    pub tokens: usize,
    pub sets: usize,
    pub skipped: Vec<ExportError>,
    pub unknown_sets: Vec<String>,
    pub written: Vec<WrittenArtifact>,
    pub failed: Vec<(PathBuf, ExportError)>,
    pub validation: ValidationOutcome,
}

/// Run a full export as configured
pub async fn run_export(config: &ExportConfig) -> Result<ExportSummary> {
    let feed = load_feed(&config.source).await?;
    let (db, report) = CardDatabase::build(&feed, &config.profile);

    let info = ExportMetadata::now(
        config.author.clone(),
        config.source.to_string(),
        config.profile.format_version.clone(),
    );
    let doc = db.to_document(info, &config.profile);
    let split = doc.partition();

    let mut summary = ExportSummary {
        cards: doc.card_count(),
        crypt: split.crypt.len(),
        library: split.library.len(),
        tokens: db.tokens().count(),
        sets: doc.sets.len(),
        skipped: report.skipped,
        unknown_sets: report.unknown_sets,
        written: Vec::new(),
        failed: Vec::new(),
        validation: ValidationOutcome::NotRequested,
    };

    write_artifacts(&doc, config, &mut summary).await;

    if config.has_outputs() && summary.written.is_empty() {
        let reasons: Vec<String> = summary
            .failed
            .iter()
            .map(|(path, e)| format!("{}: {e}", path.display()))
            .collect();
        return Err(ExportError::OutputFailed(reasons.join("; ")));
    }
    Ok(summary)
}

/// Emit and write every artifact the config asks for
///
/// Failures are recorded in `summary.failed`; later artifacts are still
/// attempted.
pub async fn write_artifacts(
    doc: &CardDatabaseDocument,
    config: &ExportConfig,
    summary: &mut ExportSummary,
) {
    if let Some(path) = &config.xml {
        let emitter = MarkupEmitter::new(config.schema_location());
        match emitter.emit(doc) {
            Ok(bytes) => {
                if config.validate {
                    summary.validation = validate_markup(config, &bytes).await;
                }
                write_one(path, emitter.name(), &bytes, summary).await;
            }
            Err(e) => record_failure(path, e, summary),
        }
    }

    if let Some(path) = &config.json {
        emit_and_write(&JsonEmitter::new(config.pretty_json), doc, path, summary).await;
    }

    if let Some(path) = &config.binary {
        let emitter = BinaryEmitter;
        match emitter.emit(doc) {
            Ok(bytes) => {
                write_one(path, emitter.name(), &bytes, summary).await;
                if let (Some(compression), Some(packed_path)) =
                    (config.compression, config.compressed_binary_path())
                {
                    match compression.compress(&bytes) {
                        Ok(packed) => {
                            write_one(&packed_path, compression.extension(), &packed, summary)
                                .await
                        }
                        Err(e) => record_failure(&packed_path, e, summary),
                    }
                }
            }
            Err(e) => record_failure(path, e, summary),
        }
    }
}

async fn emit_and_write(
    emitter: &impl Emitter,
    doc: &CardDatabaseDocument,
    path: &Path,
    summary: &mut ExportSummary,
) {
    match emitter.emit(doc) {
        Ok(bytes) => write_one(path, emitter.name(), &bytes, summary).await,
        Err(e) => record_failure(path, e, summary),
    }
}

async fn write_one(path: &Path, format: &'static str, bytes: &[u8], summary: &mut ExportSummary) {
    match write_file(path, bytes).await {
        Ok(()) => {
            info!(path = %path.display(), format, bytes = bytes.len(), "wrote artifact");
            summary.written.push(WrittenArtifact {
                path: path.to_path_buf(),
                format,
                bytes: bytes.len(),
            });
        }
        Err(e) => record_failure(path, e, summary),
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

fn record_failure(path: &Path, error: ExportError, summary: &mut ExportSummary) {
    warn!(path = %path.display(), error = %error, "failed to write artifact");
    summary.failed.push((path.to_path_buf(), error));
}

/// Validate emitted markup against the configured schema
///
/// Never fails: an unusable schema skips validation with a warning.
pub async fn validate_markup(config: &ExportConfig, xml: &[u8]) -> ValidationOutcome {
    let schema = match fetch_schema(&config.schema).await.and_then(|b| XsdSchema::parse(&b)) {
        Ok(schema) => schema,
        Err(e) => {
            warn!(schema = %config.schema, error = %e, "skipping schema validation");
            return ValidationOutcome::Skipped(e.to_string());
        }
    };

    let violations = match schema.validate_bytes(xml) {
        Ok(violations) => violations,
        Err(e) => {
            warn!(error = %e, "emitted markup could not be re-read for validation");
            return ValidationOutcome::Skipped(e.to_string());
        }
    };

    if violations.is_empty() {
        debug!(schema = %config.schema, "markup passed schema validation");
        return ValidationOutcome::Passed;
    }

    for violation in violations.iter().take(MAX_LOGGED_VIOLATIONS) {
        warn!(path = %violation.path, "schema violation: {}", violation.message);
    }
    if violations.len() > MAX_LOGGED_VIOLATIONS {
        warn!(
            more = violations.len() - MAX_LOGGED_VIOLATIONS,
            "further schema violations not shown"
        );
    }
    ValidationOutcome::Failed(violations)
}
