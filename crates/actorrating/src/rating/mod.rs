pub mod aggregate;
pub mod character;
pub mod model;
pub mod repo;
pub mod score;
pub mod tier;

pub use aggregate::{enrich_rating, summarize_performances};
pub use character::{aggregate_role_name, resolve_character_display, UNKNOWN_CHARACTER};
pub use model::{NewRating, PerformanceSummary, RatingRow, RatingView, ShareCard};
pub use repo::RatingsRepo;
pub use score::{
    compute_weighted_score, score, share_score, FieldError, PerformanceRating,
    PerformanceRatingInput, ValidationError, WeightedScore, WEIGHTS,
};
pub use tier::QualityTier;
