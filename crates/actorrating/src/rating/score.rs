use serde::{Deserialize, Serialize};

use super::tier::QualityTier;

pub const MIN_SUB_SCORE: i32 = 0;
pub const MAX_SUB_SCORE: i32 = 100;

/// Fixed criterion weights. Changing any of these breaks comparability with
/// every stored score, so a change must ship together with `backfill-scores`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub emotional_range_depth: f64,
    pub character_believability: f64,
    pub technical_skill: f64,
    pub screen_presence: f64,
    pub chemistry_interaction: f64,
}

pub const WEIGHTS: Weights = Weights {
    emotional_range_depth: 0.25,
    character_believability: 0.25,
    technical_skill: 0.20,
    screen_presence: 0.15,
    chemistry_interaction: 0.15,
};

impl Weights {
    pub fn sum(&self) -> f64 {
        self.emotional_range_depth
            + self.character_believability
            + self.technical_skill
            + self.screen_presence
            + self.chemistry_interaction
    }
}

/// The five sub-scores of a single performance rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRating {
    pub emotional_range_depth: i32,
    pub character_believability: i32,
    pub technical_skill: i32,
    pub screen_presence: i32,
    pub chemistry_interaction: i32,
}

impl PerformanceRating {
    pub fn new(
        emotional_range_depth: i32,
        character_believability: i32,
        technical_skill: i32,
        screen_presence: i32,
        chemistry_interaction: i32,
    ) -> Self {
        Self {
            emotional_range_depth,
            character_believability,
            technical_skill,
            screen_presence,
            chemistry_interaction,
        }
    }

    pub fn fields(&self) -> [(&'static str, i32); 5] {
        [
            ("emotionalRangeDepth", self.emotional_range_depth),
            ("characterBelievability", self.character_believability),
            ("technicalSkill", self.technical_skill),
            ("screenPresence", self.screen_presence),
            ("chemistryInteraction", self.chemistry_interaction),
        ]
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields: Vec<FieldError> = self
            .fields()
            .into_iter()
            .filter(|(_, v)| !(MIN_SUB_SCORE..=MAX_SUB_SCORE).contains(v))
            .map(|(field, v)| FieldError::out_of_range(field, v))
            .collect();

        if fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { fields })
        }
    }
}

/// Wire shape of the five sub-scores before validation: every field is
/// optional so that a missing field is reported instead of rejected by serde.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRatingInput {
    pub emotional_range_depth: Option<i32>,
    pub character_believability: Option<i32>,
    pub technical_skill: Option<i32>,
    pub screen_presence: Option<i32>,
    pub chemistry_interaction: Option<i32>,
}

impl PerformanceRatingInput {
    pub fn validate(&self) -> Result<PerformanceRating, ValidationError> {
        let raw = [
            ("emotionalRangeDepth", self.emotional_range_depth),
            ("characterBelievability", self.character_believability),
            ("technicalSkill", self.technical_skill),
            ("screenPresence", self.screen_presence),
            ("chemistryInteraction", self.chemistry_interaction),
        ];

        let mut fields = Vec::new();
        for (field, value) in raw {
            match value {
                None => fields.push(FieldError::missing(field)),
                Some(v) if !(MIN_SUB_SCORE..=MAX_SUB_SCORE).contains(&v) => {
                    fields.push(FieldError::out_of_range(field, v))
                }
                Some(_) => {}
            }
        }

        if !fields.is_empty() {
            return Err(ValidationError { fields });
        }

        Ok(PerformanceRating {
            emotional_range_depth: self.emotional_range_depth.unwrap_or_default(),
            character_believability: self.character_believability.unwrap_or_default(),
            technical_skill: self.technical_skill.unwrap_or_default(),
            screen_presence: self.screen_presence.unwrap_or_default(),
            chemistry_interaction: self.chemistry_interaction.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}

impl FieldError {
    fn missing(field: &'static str) -> Self {
        Self {
            field,
            reason: "missing".to_string(),
        }
    }

    /// The referenced catalog row does not exist.
    pub fn unknown_reference(field: &'static str, id: i64) -> Self {
        Self {
            field,
            reason: format!("no record with id {id}"),
        }
    }

    fn out_of_range(field: &'static str, value: i32) -> Self {
        Self {
            field,
            reason: format!("{value} is outside {MIN_SUB_SCORE}..={MAX_SUB_SCORE}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid rating: {}", describe(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.field).collect()
    }
}

fn describe(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{} ({})", f.field, f.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Weighted score in [0, 100] for validated input. Input outside 0..=100 is
/// not clamped; callers validate first.
pub fn compute_weighted_score(input: &PerformanceRating) -> f64 {
    WEIGHTS.emotional_range_depth * f64::from(input.emotional_range_depth)
        + WEIGHTS.character_believability * f64::from(input.character_believability)
        + WEIGHTS.technical_skill * f64::from(input.technical_skill)
        + WEIGHTS.screen_presence * f64::from(input.screen_presence)
        + WEIGHTS.chemistry_interaction * f64::from(input.chemistry_interaction)
}

/// Rounds half away from zero.
pub fn share_score(score: f64) -> i32 {
    score.round() as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedScore {
    pub score: f64,
    pub share_score: i32,
    pub quality_tier: QualityTier,
}

pub fn score(input: &PerformanceRating) -> WeightedScore {
    let score = compute_weighted_score(input);
    WeightedScore {
        score,
        share_score: share_score(score),
        quality_tier: QualityTier::classify(score),
    }
}
