use shared::{AnalysisStatus, PredictionResult};

/// Receives progress and results from `ClassifierService::analyze`.
///
/// The presentation layer renders from these callbacks; the service never
/// touches UI state directly.
pub trait AnalysisObserver {
    fn on_status(&mut self, status: &AnalysisStatus);

    fn on_result(&mut self, result: &PredictionResult);
}

impl AnalysisObserver for () {
    fn on_status(&mut self, _status: &AnalysisStatus) {}

    fn on_result(&mut self, _result: &PredictionResult) {}
}

/// Collects every callback, in order. Handy for tests and for replaying a run.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub statuses: Vec<AnalysisStatus>,
    pub results: Vec<PredictionResult>,
}

impl AnalysisObserver for RecordingObserver {
    fn on_status(&mut self, status: &AnalysisStatus) {
        self.statuses.push(status.clone());
    }

    fn on_result(&mut self, result: &PredictionResult) {
        self.results.push(*result);
    }
}
