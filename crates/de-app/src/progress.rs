use de_core::PairId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComputeStage {
    CheckingCache,
    LoadingCachedResult,
    ComputingPairs,
    PairCompleted,
    SavingResults,
    Completed,
}

impl ComputeStage {
    pub fn label(&self) -> &'static str {
        match self {
            ComputeStage::CheckingCache => "checking-cache",
            ComputeStage::LoadingCachedResult => "loading-cache",
            ComputeStage::ComputingPairs => "computing",
            ComputeStage::PairCompleted => "pair-done",
            ComputeStage::SavingResults => "saving",
            ComputeStage::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PairProgress {
    pub pair: Option<PairId>,
    pub completed: usize,
    pub total: usize,
    pub pair_elapsed_s: f64,
}

impl PairProgress {
    pub fn fraction_complete(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComputeProgressEvent {
    pub stage: ComputeStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    pub pairs: Option<PairProgress>,
}
