use serde::Serialize;

use crate::config::{TierBound, TierThresholds};
use crate::parser::sections::SectionCounters;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityAssessment {
    /// Quality score rounded to the nearest integer.
    pub technical_depth: u8,
    /// Share of lines carrying headings or comments, on a 0-10 scale.
    pub documentation_completeness: u8,
    pub error_rate: f64,
    pub actionable_insights: usize,
    /// 1 = ready to integrate, 2 = needs curation, 3 = needs significant work.
    pub priority_tier: u8,
}

pub fn assess(
    counters: &SectionCounters,
    quality_score: f64,
    insight_count: usize,
    tiers: &TierThresholds,
) -> QualityAssessment {
    let technical_depth = quality_score.round().clamp(0.0, 10.0) as u8;
    let documentation_completeness = if counters.entry_count == 0 {
        0
    } else {
        let ratio = counters.documented_lines as f64 / counters.entry_count as f64;
        (ratio * 10.0).round().min(10.0) as u8
    };
    let error_rate = counters.error_fraction();

    let meets = |bound: &TierBound| {
        technical_depth >= bound.min_technical_depth
            && documentation_completeness >= bound.min_documentation
            && error_rate < bound.max_error_rate
    };
    let priority_tier = if meets(&tiers.tier1) {
        1
    } else if meets(&tiers.tier2) {
        2
    } else {
        3
    };

    QualityAssessment {
        technical_depth,
        documentation_completeness,
        error_rate,
        actionable_insights: insight_count,
        priority_tier,
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Policy;

    fn counters(entries: usize, documented: usize, errors: usize) -> SectionCounters {
        SectionCounters {
            entry_count: entries,
            documented_lines: documented,
            error_lines: errors,
            ..SectionCounters::default()
        }
    }

    #[test]
    fn well_documented_clean_section_is_tier_one() {
        let tiers = Policy::default().tiers;
        let a = assess(&counters(10, 8, 1), 8.4, 3, &tiers);
        assert_eq!(a.technical_depth, 8);
        assert_eq!(a.documentation_completeness, 8);
        assert_eq!(a.actionable_insights, 3);
        assert_eq!(a.priority_tier, 1);
    }

    #[test]
    fn middling_section_is_tier_two() {
        let tiers = Policy::default().tiers;
        let a = assess(&counters(10, 5, 3), 6.2, 0, &tiers);
        assert_eq!(a.priority_tier, 2);
        assert!((a.error_rate - 0.3).abs() < 1e-9);
    }

    #[test]
    fn error_heavy_section_is_tier_three() {
        let tiers = Policy::default().tiers;
        let a = assess(&counters(10, 10, 5), 9.0, 0, &tiers);
        assert_eq!(a.priority_tier, 3);
    }

    #[test]
    fn empty_section_has_zero_completeness() {
        let tiers = Policy::default().tiers;
        let a = assess(&SectionCounters::default(), 5.0, 0, &tiers);
        assert_eq!(a.documentation_completeness, 0);
        assert_eq!(a.error_rate, 0.0);
        assert_eq!(a.priority_tier, 3);
    }
}
