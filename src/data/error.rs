use std::path::PathBuf;

/// Failure to read the listings source. Always fatal for the dashboard.
///
/// `Clone` because the outcome of the first load is cached for the whole
/// process and handed out to every caller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("dataset not found: {}", .path.display())]
    Missing { path: PathBuf },

    #[error("cannot read {}: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("malformed dataset {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
}

/// The source table lacks columns the derived metrics depend on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("required column(s) missing: {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),
}

/// Anything that stops the dashboard from rendering at all.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DashboardError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
