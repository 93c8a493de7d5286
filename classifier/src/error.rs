use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("Cannot read image {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("Corrupt image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Tensor construction failed: {0}")]
    Tensor(#[from] ndarray::ShapeError),
}

/// Raised only while constructing the service; the caller falls back to demo mode.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("Model file not found: {0}")]
    NotFound(PathBuf),
    #[error("Model load failed: {0}")]
    Load(String),
    #[error("Built without an inference backend (enable the `torch` feature)")]
    BackendUnavailable,
}

/// A tensor handed to the classifier does not honor the input contract.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ContractViolation {
    #[error("Expected tensor shape {expected:?}, got {actual:?}")]
    Shape {
        expected: [usize; 4],
        actual: Vec<usize>,
    },
    #[error("Tensor value {value} at flat index {index} is outside [0, 1]")]
    ValueOutOfRange { index: usize, value: f32 },
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Model backend error: {0}")]
    Backend(String),
    #[error("Expected a single output value, model produced {0}")]
    UnexpectedOutput(usize),
    #[error("Model returned probability {0} outside [0, 1]")]
    ProbabilityOutOfRange(f32),
    #[error("Model lock poisoned")]
    Poisoned,
}

#[cfg(feature = "torch")]
impl From<tch::TchError> for InferenceError {
    fn from(err: tch::TchError) -> Self {
        InferenceError::Backend(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}
