pub mod classifier;
pub mod model;
pub mod observer;
pub mod preprocess;
pub mod tensor;

pub use classifier::{ClassifierService, ModelState};
pub use model::{DefaultLoader, ModelLoader, Predictor};
pub use observer::{AnalysisObserver, RecordingObserver};
pub use preprocess::Preprocessor;
pub use tensor::InputTensor;
