use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityTier {
    Masterpiece,
    Excellent,
    Good,
    Decent,
    Average,
    NeedsWork,
}

// Lower bounds, checked top-down.
const THRESHOLDS: [(f64, QualityTier); 5] = [
    (90.0, QualityTier::Masterpiece),
    (80.0, QualityTier::Excellent),
    (70.0, QualityTier::Good),
    (60.0, QualityTier::Decent),
    (40.0, QualityTier::Average),
];

impl QualityTier {
    /// Scores are expected in [0, 100]; anything below 40 (NaN included)
    /// lands in `NeedsWork`.
    pub fn classify(score: f64) -> Self {
        THRESHOLDS
            .iter()
            .find(|(min, _)| score >= *min)
            .map(|(_, tier)| *tier)
            .unwrap_or(QualityTier::NeedsWork)
    }

    pub fn label(&self) -> &'static str {
        match self {
            QualityTier::Masterpiece => "Masterpiece",
            QualityTier::Excellent => "Excellent",
            QualityTier::Good => "Good",
            QualityTier::Decent => "Decent",
            QualityTier::Average => "Average",
            QualityTier::NeedsWork => "Needs Work",
        }
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for QualityTier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
