use crate::domain::SearchResult;

pub const DEFAULT_RELEVANCE_THRESHOLD: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    Pass { best_score: f32 },
    Reject { best_score: f32 },
}

impl GateDecision {
    pub fn passed(&self) -> bool {
        matches!(self, Self::Pass { .. })
    }

    pub fn best_score(&self) -> f32 {
        match self {
            Self::Pass { best_score } | Self::Reject { best_score } => *best_score,
        }
    }
}

/// Refuses to synthesize when even the best match is weak. A blunt cut-off,
/// not a calibrated probability.
#[derive(Debug, Clone, Copy)]
pub struct RelevanceGate {
    threshold: f32,
}

impl RelevanceGate {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn best_score(results: &[SearchResult]) -> f32 {
        results
            .iter()
            .map(|r| if r.score.is_nan() { 0.0 } else { r.score })
            .fold(0.0, f32::max)
    }

    pub fn check(&self, results: &[SearchResult]) -> GateDecision {
        let best_score = Self::best_score(results);
        if best_score < self.threshold {
            GateDecision::Reject { best_score }
        } else {
            GateDecision::Pass { best_score }
        }
    }
}

impl Default for RelevanceGate {
    fn default() -> Self {
        Self::new(DEFAULT_RELEVANCE_THRESHOLD)
    }
}
