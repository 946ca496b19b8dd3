//! Error types for the Sous-Chef domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all Sous-Chef operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Oracle (model provider) errors ---
    #[error("Oracle unavailable: {0}")]
    OracleUnavailable(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Persistence errors ---
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid parameters for {tool}: '{field}' {reason}")]
    InvalidParameters {
        tool: String,
        field: String,
        reason: String,
    },

    #[error("Tool execution failed: {tool}: {reason}")]
    ExecutionFailed { tool: String, reason: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read memory bank at {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to write memory bank at {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Memory bank at {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Unsupported memory bank version {found} (this build reads up to {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}
