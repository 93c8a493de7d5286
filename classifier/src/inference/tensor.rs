use ndarray::Array4;

use crate::error::ContractViolation;

/// Square input resolution the model was trained on.
pub const INPUT_SIZE: usize = 150;
pub const CHANNELS: usize = 3;
pub const INPUT_SHAPE: [usize; 4] = [1, INPUT_SIZE, INPUT_SIZE, CHANNELS];

/// A batch of one RGB image, NHWC, values in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor(Array4<f32>);

impl InputTensor {
    /// Checked constructor for callers that build tensors themselves.
    pub fn from_array(array: Array4<f32>) -> Result<Self, ContractViolation> {
        if array.shape() != INPUT_SHAPE {
            return Err(ContractViolation::Shape {
                expected: INPUT_SHAPE,
                actual: array.shape().to_vec(),
            });
        }
        if let Some((index, &value)) = array
            .iter()
            .enumerate()
            .find(|(_, v)| !(0.0..=1.0).contains(*v))
        {
            return Err(ContractViolation::ValueOutOfRange { index, value });
        }
        if array.is_standard_layout() {
            Ok(Self(array))
        } else {
            Ok(Self(array.as_standard_layout().into_owned()))
        }
    }

    /// Skips validation; the preprocessor only produces conforming arrays.
    pub(crate) fn from_preprocessed(array: Array4<f32>) -> Self {
        debug_assert_eq!(array.shape(), INPUT_SHAPE);
        Self(array)
    }

    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    pub fn view(&self) -> ndarray::ArrayView4<'_, f32> {
        self.0.view()
    }

    /// Contiguous NHWC data.
    pub fn as_slice(&self) -> &[f32] {
        self.0
            .as_slice()
            .unwrap_or_else(|| unreachable!("input tensors are always in standard layout"))
    }

    pub fn into_inner(self) -> Array4<f32> {
        self.0
    }
}
