use sf_sweep::SweepProgressEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum RunStage {
    LoadingStudy,
    OpeningSession,
    Sweeping,
    WritingManifest,
    Completed,
}

impl RunStage {
    pub fn label(&self) -> &'static str {
        match self {
            RunStage::LoadingStudy => "Loading study",
            RunStage::OpeningSession => "Opening engine session",
            RunStage::Sweeping => "Sweeping",
            RunStage::WritingManifest => "Writing manifest",
            RunStage::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    /// Set for per-case events while sweeping.
    pub case: Option<SweepProgressEvent>,
}

impl RunProgressEvent {
    pub fn stage(stage: RunStage, elapsed_wall_s: f64, message: Option<String>) -> Self {
        Self {
            stage,
            elapsed_wall_s,
            message,
            case: None,
        }
    }
}
