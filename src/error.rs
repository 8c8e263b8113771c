use std::path::PathBuf;

pub type TracerResult<T> = Result<T, TracerError>;

/// Every failure the frame pipeline can hit. None of them are retried; the
/// caller is expected to stop rendering and exit.
#[derive(thiserror::Error, Debug)]
pub enum TracerError {
    #[error("resource missing: {}: {source}", path.display())]
    ResourceMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse mesh {}: {reason}", path.display())]
    MeshParse { path: PathBuf, reason: String },

    #[error("no usable gpu device: {0}")]
    DeviceUnavailable(String),

    #[error("cannot allocate device memory for {buffer}: {reason}")]
    DeviceAllocationFailure {
        buffer: &'static str,
        reason: String,
    },

    #[error("cannot build program\n{log}")]
    ProgramBuildFailure { log: String },

    #[error("cannot set kernel argument {argument}: {reason}")]
    KernelBindFailure {
        argument: &'static str,
        reason: String,
    },

    #[error("dispatch failed: {0}")]
    DispatchFailure(String),

    #[error("cannot write snapshot: {0}")]
    Snapshot(#[from] image::ImageError),
}

impl TracerError {
    pub fn resource_missing(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ResourceMissing {
            path: path.into(),
            source,
        }
    }

    pub fn mesh_parse(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::MeshParse {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn allocation(buffer: &'static str, reason: impl ToString) -> Self {
        Self::DeviceAllocationFailure {
            buffer,
            reason: reason.to_string(),
        }
    }

    pub fn bind(argument: &'static str, reason: impl ToString) -> Self {
        Self::KernelBindFailure {
            argument,
            reason: reason.to_string(),
        }
    }

    pub fn dispatch(reason: impl Into<String>) -> Self {
        Self::DispatchFailure(reason.into())
    }
}
