use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("log {} does not contain an MRI_start entry", path.display())]
    MissingStartMarker { path: PathBuf },
    #[error("did not find exactly 3 logs, found {found}: {listing}")]
    WrongLogCount { found: usize, listing: String },
    #[error("malformed {event} line {line} in {}: {reason}", path.display())]
    MalformedLine {
        event: &'static str,
        line: usize,
        path: PathBuf,
        reason: String,
    },
    #[error("block label {label} not present in {table}")]
    UnknownBlockLabel { label: String, table: String },
    #[error("{} is not formatted properly: {reason}", path.display())]
    MalformedTable { path: PathBuf, reason: String },
    #[error("failed to render plot: {0}")]
    Plot(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for TaskError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        TaskError::Plot(format!("{value:?}"))
    }
}

impl From<image::ImageError> for TaskError {
    fn from(value: image::ImageError) -> Self {
        TaskError::Plot(value.to_string())
    }
}
