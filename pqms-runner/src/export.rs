// PQMS Runner - Export file writer
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Writes the engine's export document to disk.

use crate::error::RunnerError;
use pqms::{ExportDocument, TransmissionEngine};
use std::path::{Path, PathBuf};
use tracing::info;

/// Capture `engine` and write `pqms-export-<now_ms>.json` into `dir`.
pub fn write_export(
    dir: &Path,
    engine: &TransmissionEngine,
    now_ms: u64,
) -> Result<PathBuf, RunnerError> {
    if !dir.is_dir() {
        return Err(RunnerError::ExportDirMissing(dir.display().to_string()));
    }

    let document = ExportDocument::capture(engine, now_ms);
    let path = dir.join(ExportDocument::file_name(now_ms));
    std::fs::write(&path, document.to_json_pretty()?)?;

    info!(
        "Exported {} log entries and {} samples to {}",
        document.logs.len(),
        document.metrics_history.len(),
        path.display()
    );
    Ok(path)
}
