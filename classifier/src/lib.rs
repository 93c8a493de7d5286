pub mod config;
pub mod error;
pub mod inference;
pub mod preview;

pub use config::ClassifierConfig;
pub use error::{AnalysisError, ContractViolation, InferenceError, ModelLoadError, PreprocessError};
pub use inference::{ClassifierService, InputTensor, Preprocessor};
