// PQMS Runner - Error types
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

/// Runner errors.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Engine error: {0}")]
    Engine(#[from] pqms::MeshError),

    #[error("Configuration error: {0}")]
    Config(#[from] pqms::ConfigError),

    #[error("Export directory not found: {0}")]
    ExportDirMissing(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
