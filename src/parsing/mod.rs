pub mod extract;
pub mod patterns;

pub use extract::{extract_kcal_range, extract_score, extract_title};
pub use patterns::{extract_correction, match_intent, match_steps, match_weight, Intent};
