use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Probabilities strictly below this value are classified as fertile.
pub const FERTILE_THRESHOLD: f32 = 0.5;

pub const APP_BANNER: &str = "© 2023 Egg Fertility Classifier v1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum Verdict {
    Fertile,
    Infertile,
}

impl Verdict {
    /// The model emits an infertility score: low values mean fertile.
    pub fn from_probability(probability: f32) -> Self {
        if probability < FERTILE_THRESHOLD {
            Verdict::Fertile
        } else {
            Verdict::Infertile
        }
    }
}

/// Where a probability came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PredictionSource {
    Model,
    Demo,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub probability: f32,
    pub verdict: Verdict,
    pub confidence_percent: f32,
    pub source: PredictionSource,
}

impl PredictionResult {
    pub fn from_probability(probability: f32, source: PredictionSource) -> Self {
        Self {
            probability,
            verdict: Verdict::from_probability(probability),
            confidence_percent: probability * 100.0,
            source,
        }
    }

    pub fn is_fertile(&self) -> bool {
        self.verdict == Verdict::Fertile
    }

    pub fn confidence_label(&self) -> String {
        format!("Confidence: {:.2}%", self.confidence_percent)
    }
}

/// Progress messages shown to the user while an image is analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisStatus {
    Ready,
    Analyzing,
    Complete,
    DemoPrediction,
    /// The image could not be read or decoded.
    Failed(String),
    /// The image was fine but the model run failed.
    InferenceFailed(String),
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisStatus::Ready => write!(f, "Ready to analyze"),
            AnalysisStatus::Analyzing => write!(f, "Analyzing image..."),
            AnalysisStatus::Complete => write!(f, "Analysis complete"),
            AnalysisStatus::DemoPrediction => write!(f, "Demo mode: Using random prediction"),
            AnalysisStatus::Failed(msg) => write!(f, "Error: {}", msg),
            AnalysisStatus::InferenceFailed(msg) => write!(f, "Error during analysis: {}", msg),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
pub enum ServiceMode {
    Model,
    Demo,
}

impl ServiceMode {
    pub fn footer(&self) -> &'static str {
        match self {
            ServiceMode::Model => APP_BANNER,
            ServiceMode::Demo => "Demo Mode",
        }
    }
}
