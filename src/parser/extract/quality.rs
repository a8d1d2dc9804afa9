use crate::config::ScoreWeights;
use crate::parser::sections::SectionCounters;

/// Heuristic quality score in `[0, 10]`.
///
/// Starts at the baseline, adds capped bonuses for technical keyword
/// occurrences and achievement lines, and subtracts a penalty proportional to
/// the error-line fraction that steepens past `error_threshold`.
pub fn score(counters: &SectionCounters, weights: &ScoreWeights) -> f64 {
    let technical = (counters.technical_hits as f64 * weights.technical_weight).min(weights.technical_cap);
    let achievement =
        (counters.achievement_lines as f64 * weights.achievement_weight).min(weights.achievement_cap);

    let fraction = counters.error_fraction();
    let steep = (fraction - weights.error_threshold).max(0.0);
    let penalty = fraction * weights.error_weight + steep * weights.error_steep_weight;

    (weights.baseline + technical + achievement - penalty).clamp(0.0, 10.0)
}

// ── Tests ──
