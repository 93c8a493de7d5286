use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek};
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use ndarray::Array4;

use super::tensor::{CHANNELS, INPUT_SIZE, InputTensor};
use crate::config::PreprocessingConfig;
use crate::error::PreprocessError;

const ACCEPTED_FORMATS: [ImageFormat; 2] = [ImageFormat::Jpeg, ImageFormat::Png];

/// Turns an image file into the model's input tensor.
///
/// The image is stretched to 150x150 without letterboxing, so the aspect
/// ratio of the source is lost.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    filter: FilterType,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(&PreprocessingConfig::default())
    }
}

impl Preprocessor {
    pub fn new(config: &PreprocessingConfig) -> Self {
        Self {
            filter: config.resize_filter.filter_type(),
        }
    }

    pub fn preprocess(&self, image_path: &Path) -> Result<InputTensor, PreprocessError> {
        let image = load_image(image_path)?;
        self.to_tensor(&image)
    }

    pub fn preprocess_bytes(&self, bytes: &[u8]) -> Result<InputTensor, PreprocessError> {
        let image = decode(ImageReader::new(Cursor::new(bytes)), "<memory>")?;
        self.to_tensor(&image)
    }

    fn to_tensor(&self, image: &DynamicImage) -> Result<InputTensor, PreprocessError> {
        let size = INPUT_SIZE as u32;
        let rgb = image.resize_exact(size, size, self.filter).to_rgb8();
        let data: Vec<f32> = rgb
            .into_raw()
            .into_iter()
            .map(|v| v as f32 / 255.0)
            .collect();
        let array = Array4::from_shape_vec((1, INPUT_SIZE, INPUT_SIZE, CHANNELS), data)?;
        log::debug!(
            "Preprocessed {}x{} image into tensor {:?}",
            image.width(),
            image.height(),
            array.shape()
        );
        Ok(InputTensor::from_preprocessed(array))
    }
}

/// Opens a JPEG or PNG file. The format is sniffed from the file contents;
/// the extension is ignored.
pub fn load_image(image_path: &Path) -> Result<DynamicImage, PreprocessError> {
    let file = File::open(image_path).map_err(|source| PreprocessError::Io {
        path: image_path.to_path_buf(),
        source,
    })?;
    decode(
        ImageReader::new(BufReader::new(file)),
        &image_path.display().to_string(),
    )
}

fn decode<R: BufRead + Seek>(
    reader: ImageReader<R>,
    source: &str,
) -> Result<DynamicImage, PreprocessError> {
    let reader = reader.with_guessed_format().map_err(image::ImageError::IoError)?;
    match reader.format() {
        Some(format) if ACCEPTED_FORMATS.contains(&format) => Ok(reader.decode()?),
        Some(format) => Err(PreprocessError::UnsupportedFormat(format!(
            "{} is {:?}, expected JPEG or PNG",
            source, format
        ))),
        None => Err(PreprocessError::UnsupportedFormat(format!(
            "{} is not a recognizable image",
            source
        ))),
    }
}
