use std::fmt;
use std::path::Path;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{AnalysisStatus, PredictionResult, PredictionSource, ServiceMode};

use super::model::{DefaultLoader, ModelLoader, Predictor, check_probability};
use super::observer::AnalysisObserver;
use super::preprocess::Preprocessor;
use super::tensor::InputTensor;
use crate::config::ClassifierConfig;
use crate::error::{AnalysisError, InferenceError, ModelLoadError};

pub const DEMO_MIN_PROBABILITY: f32 = 0.1;
pub const DEMO_MAX_PROBABILITY: f32 = 0.9;

/// Decided once at startup. There is no path from `Demo` back to `Loaded`.
pub enum ModelState {
    Loaded(Box<dyn Predictor>),
    Demo(ModelLoadError),
}

impl ModelState {
    pub fn load(loader: &dyn ModelLoader, model_path: &Path) -> Self {
        match loader.load(model_path) {
            Ok(predictor) => {
                log::info!("Model ready: {}", predictor.describe());
                ModelState::Loaded(predictor)
            }
            Err(e) => {
                log::warn!("Model not available ({}). Running in demo mode.", e);
                ModelState::Demo(e)
            }
        }
    }
}

impl fmt::Debug for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelState::Loaded(predictor) => f
                .debug_tuple("Loaded")
                .field(&predictor.describe())
                .finish(),
            ModelState::Demo(reason) => f.debug_tuple("Demo").field(reason).finish(),
        }
    }
}

#[derive(Debug)]
pub struct ClassifierService {
    state: ModelState,
    preprocessor: Preprocessor,
    demo_rng: Mutex<StdRng>,
}

impl ClassifierService {
    /// Loads the configured model, or falls back to demo mode if that fails.
    pub fn new(config: &ClassifierConfig) -> Self {
        Self::with_loader(&DefaultLoader::new(config.model.device), config)
    }

    pub fn with_loader(loader: &dyn ModelLoader, config: &ClassifierConfig) -> Self {
        Self::from_state(ModelState::load(loader, &config.model.path), config)
    }

    pub fn with_predictor(predictor: Box<dyn Predictor>, config: &ClassifierConfig) -> Self {
        Self::from_state(ModelState::Loaded(predictor), config)
    }

    pub fn from_state(state: ModelState, config: &ClassifierConfig) -> Self {
        let rng = match config.demo.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            state,
            preprocessor: Preprocessor::new(&config.preprocessing),
            demo_rng: Mutex::new(rng),
        }
    }

    pub fn is_model_loaded(&self) -> bool {
        matches!(self.state, ModelState::Loaded(_))
    }

    pub fn mode(&self) -> ServiceMode {
        match self.state {
            ModelState::Loaded(_) => ServiceMode::Model,
            ModelState::Demo(_) => ServiceMode::Demo,
        }
    }

    pub fn demo_reason(&self) -> Option<&ModelLoadError> {
        match &self.state {
            ModelState::Loaded(_) => None,
            ModelState::Demo(reason) => Some(reason),
        }
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    /// Runs the forward pass, or draws a demo probability when no model is loaded.
    pub fn classify(&self, tensor: InputTensor) -> Result<f32, InferenceError> {
        match &self.state {
            ModelState::Loaded(predictor) => {
                let probability = check_probability(predictor.predict(&tensor)?)?;
                log::debug!("Model probability: {:.4}", probability);
                Ok(probability)
            }
            ModelState::Demo(_) => Ok(self.classify_demo()),
        }
    }

    /// Uniform in [0.1, 0.9].
    pub fn classify_demo(&self) -> f32 {
        let mut rng = self.demo_rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.random_range(DEMO_MIN_PROBABILITY..=DEMO_MAX_PROBABILITY)
    }

    pub fn evaluate(&self, probability: f32) -> PredictionResult {
        let source = match self.mode() {
            ServiceMode::Model => PredictionSource::Model,
            ServiceMode::Demo => PredictionSource::Demo,
        };
        PredictionResult::from_probability(probability, source)
    }

    /// Full pipeline for one image, reporting progress to `observer`.
    ///
    /// Preprocessing also runs in demo mode so unreadable inputs are rejected
    /// either way. On failure the observer sees `Failed` or `InferenceFailed`
    /// and no result.
    pub fn analyze(
        &self,
        image_path: &Path,
        observer: &mut dyn AnalysisObserver,
    ) -> Result<PredictionResult, AnalysisError> {
        observer.on_status(&AnalysisStatus::Analyzing);

        let outcome = self
            .preprocessor
            .preprocess(image_path)
            .map_err(AnalysisError::from)
            .and_then(|tensor| self.classify(tensor).map_err(AnalysisError::from));

        match outcome {
            Ok(probability) => {
                let result = self.evaluate(probability);
                observer.on_result(&result);
                let status = match self.mode() {
                    ServiceMode::Model => AnalysisStatus::Complete,
                    ServiceMode::Demo => AnalysisStatus::DemoPrediction,
                };
                observer.on_status(&status);
                Ok(result)
            }
            Err(e) => {
                log::error!("Analysis of {} failed: {}", image_path.display(), e);
                let status = match &e {
                    AnalysisError::Preprocess(_) => AnalysisStatus::Failed(e.to_string()),
                    AnalysisError::Inference(_) => AnalysisStatus::InferenceFailed(e.to_string()),
                };
                observer.on_status(&status);
                Err(e)
            }
        }
    }

    pub fn predict(&self, image_path: &Path) -> Result<PredictionResult, AnalysisError> {
        self.analyze(image_path, &mut ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::tensor::INPUT_SHAPE;
    use ndarray::Array4;
    use shared::Verdict;

    struct FixedPredictor(f32);

    impl Predictor for FixedPredictor {
        fn predict(&self, _input: &InputTensor) -> Result<f32, InferenceError> {
            Ok(self.0)
        }
    }

    fn blank_tensor() -> InputTensor {
        InputTensor::from_array(Array4::zeros(INPUT_SHAPE)).unwrap()
    }

    fn demo_service(seed: u64) -> ClassifierService {
        let mut config = ClassifierConfig::default();
        config.demo.seed = Some(seed);
        ClassifierService::from_state(ModelState::Demo(ModelLoadError::BackendUnavailable), &config)
    }

    #[test]
    fn loaded_state_uses_predictor() {
        let service =
            ClassifierService::with_predictor(Box::new(FixedPredictor(0.3)), &Default::default());
        assert!(service.is_model_loaded());
        assert_eq!(service.mode(), ServiceMode::Model);
        assert!(service.demo_reason().is_none());
        assert_eq!(service.classify(blank_tensor()).unwrap(), 0.3);
    }

    #[test]
    fn demo_probabilities_stay_in_band() {
        let service = demo_service(7);
        assert!(!service.is_model_loaded());
        for _ in 0..1000 {
            let p = service.classify(blank_tensor()).unwrap();
            assert!((DEMO_MIN_PROBABILITY..=DEMO_MAX_PROBABILITY).contains(&p));
        }
    }

    #[test]
    fn seeded_demo_is_reproducible() {
        let a = demo_service(42);
        let b = demo_service(42);
        let left: Vec<f32> = (0..5).map(|_| a.classify_demo()).collect();
        let right: Vec<f32> = (0..5).map(|_| b.classify_demo()).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn demo_keeps_failure_reason() {
        let service = demo_service(1);
        assert!(matches!(
            service.demo_reason(),
            Some(ModelLoadError::BackendUnavailable)
        ));
        assert_eq!(service.mode().footer(), "Demo Mode");
    }

    #[test]
    fn evaluate_tags_source() {
        let demo = demo_service(3).evaluate(0.7);
        assert_eq!(demo.source, PredictionSource::Demo);
        assert_eq!(demo.verdict, Verdict::Infertile);

        let model =
            ClassifierService::with_predictor(Box::new(FixedPredictor(0.2)), &Default::default());
        let result = model.evaluate(0.2);
        assert_eq!(result.source, PredictionSource::Model);
        assert!(result.is_fertile());
    }

    #[test]
    fn out_of_range_scores_are_rejected() {
        for score in [1.5f32, -0.2, f32::NAN, f32::INFINITY] {
            let service =
                ClassifierService::with_predictor(Box::new(FixedPredictor(score)), &Default::default());
            assert!(
                matches!(
                    service.classify(blank_tensor()),
                    Err(InferenceError::ProbabilityOutOfRange(_))
                ),
                "score {} was accepted",
                score
            );
        }
    }

    #[test]
    fn boundary_scores_are_accepted() {
        for score in [0.0f32, 0.5, 1.0] {
            let service =
                ClassifierService::with_predictor(Box::new(FixedPredictor(score)), &Default::default());
            assert_eq!(service.classify(blank_tensor()).unwrap(), score);
        }
    }

    #[test]
    fn predictor_errors_propagate() {
        struct Broken;
        impl Predictor for Broken {
            fn predict(&self, _input: &InputTensor) -> Result<f32, InferenceError> {
                Err(InferenceError::UnexpectedOutput(2))
            }
        }
        let service = ClassifierService::with_predictor(Box::new(Broken), &Default::default());
        assert!(matches!(
            service.classify(blank_tensor()),
            Err(InferenceError::UnexpectedOutput(2))
        ));
    }
}
