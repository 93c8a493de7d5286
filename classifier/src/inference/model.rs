use std::path::Path;

use super::tensor::InputTensor;
use crate::config::DeviceConfig;
use crate::error::{InferenceError, ModelLoadError};

/// A loaded model that maps one input tensor to one probability.
pub trait Predictor: Send + Sync {
    fn predict(&self, input: &InputTensor) -> Result<f32, InferenceError>;

    fn describe(&self) -> String {
        "model".to_string()
    }
}

pub trait ModelLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn Predictor>, ModelLoadError>;
}

/// Rejects non-finite scores and anything outside [0, 1].
pub fn check_probability(probability: f32) -> Result<f32, InferenceError> {
    if (0.0..=1.0).contains(&probability) {
        Ok(probability)
    } else {
        Err(InferenceError::ProbabilityOutOfRange(probability))
    }
}

/// Loader for the backend compiled into this build.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLoader {
    pub device: DeviceConfig,
}

impl DefaultLoader {
    pub fn new(device: DeviceConfig) -> Self {
        Self { device }
    }
}

#[cfg(feature = "torch")]
impl ModelLoader for DefaultLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn Predictor>, ModelLoadError> {
        Ok(Box::new(torch::TorchModel::load(path, self.device)?))
    }
}

#[cfg(not(feature = "torch"))]
impl ModelLoader for DefaultLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn Predictor>, ModelLoadError> {
        if !path.exists() {
            return Err(ModelLoadError::NotFound(path.to_path_buf()));
        }
        Err(ModelLoadError::BackendUnavailable)
    }
}

#[cfg(feature = "torch")]
mod torch {
    use std::path::Path;
    use std::sync::Mutex;

    use tch::{CModule, Device, Kind, Tensor};

    use super::{Predictor, check_probability};
    use crate::config::DeviceConfig;
    use crate::error::{InferenceError, ModelLoadError};
    use crate::inference::tensor::{INPUT_SHAPE, InputTensor};

    /// TorchScript module exported with a (1, 150, 150, 3) float input.
    pub struct TorchModel {
        model: Mutex<CModule>,
        device: Device,
    }

    impl TorchModel {
        pub fn load(model_path: &Path, device: DeviceConfig) -> Result<Self, ModelLoadError> {
            if !model_path.exists() {
                return Err(ModelLoadError::NotFound(model_path.to_path_buf()));
            }
            let device = match device {
                DeviceConfig::Auto => Device::cuda_if_available(),
                DeviceConfig::Cpu => Device::Cpu,
                DeviceConfig::Cuda => Device::Cuda(0),
            };
            let mut model = CModule::load_on_device(model_path, device)
                .map_err(|e| ModelLoadError::Load(e.to_string()))?;
            model.set_eval();
            log::info!("Loaded model {} on {:?}", model_path.display(), device);
            Ok(Self {
                model: Mutex::new(model),
                device,
            })
        }
    }

    impl Predictor for TorchModel {
        fn predict(&self, input: &InputTensor) -> Result<f32, InferenceError> {
            let shape: Vec<i64> = INPUT_SHAPE.iter().map(|&d| d as i64).collect();
            let tensor = Tensor::from_slice(input.as_slice())
                .view(shape.as_slice())
                .to_device(self.device);

            let output = {
                let model = self.model.lock().map_err(|_| InferenceError::Poisoned)?;
                tch::no_grad(|| model.forward_ts(&[tensor]))?
            };

            let output_flat = output.to_kind(Kind::Float).view([-1]);
            let num_elements = output_flat.size()[0] as usize;
            if num_elements != 1 {
                return Err(InferenceError::UnexpectedOutput(num_elements));
            }
            let mut output_vec = vec![0.0f32; num_elements];
            output_flat.copy_data(&mut output_vec, num_elements);
            check_probability(output_vec[0])
        }

        fn describe(&self) -> String {
            format!("TorchScript on {:?}", self.device)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_bounds_are_inclusive() {
        assert_eq!(check_probability(0.0).unwrap(), 0.0);
        assert_eq!(check_probability(1.0).unwrap(), 1.0);
        assert!(matches!(
            check_probability(1.01),
            Err(InferenceError::ProbabilityOutOfRange(_))
        ));
        assert!(check_probability(-0.1).is_err());
        assert!(check_probability(f32::NAN).is_err());
    }

    #[test]
    fn missing_model_file_is_not_found() {
        let err = DefaultLoader::default()
            .load(Path::new("/nonexistent/best_model.pt"))
            .err()
            .unwrap();
        assert!(matches!(err, ModelLoadError::NotFound(_)));
    }
}
