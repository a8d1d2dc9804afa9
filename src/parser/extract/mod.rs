pub mod assess;
pub mod insights;
pub mod quality;

use super::classify::SectionCategory;
use super::markers::Markers;
use super::sections::{SectionBuffer, SectionCounters};
use super::source::LogLine;
use crate::config::Policy;
use assess::QualityAssessment;

/// A finished section. Score, insights and assessment are computed once,
/// from the buffer's final counters, and never change afterwards.
#[derive(Debug, Clone)]
pub struct Section {
    pub category: SectionCategory,
    pub entries: Vec<LogLine>,
    pub byte_size: usize,
    pub quality_score: f64,
    pub insights: Vec<String>,
    pub counters: SectionCounters,
    pub assessment: QualityAssessment,
}

impl Section {
    pub fn freeze(buffer: SectionBuffer, markers: &Markers, policy: &Policy) -> Section {
        let quality_score = quality::score(&buffer.counters, &policy.scoring);
        let insights = insights::extract(&buffer.entries, markers);
        let assessment = assess::assess(&buffer.counters, quality_score, insights.len(), &policy.tiers);
        Section {
            category: buffer.category,
            byte_size: buffer.counters.byte_size,
            entries: buffer.entries,
            quality_score,
            insights,
            counters: buffer.counters,
            assessment,
        }
    }
}

/// Freeze every populated buffer, keeping category order. Empty categories
/// are dropped.
pub fn finalize(buffers: Vec<SectionBuffer>, markers: &Markers, policy: &Policy) -> Vec<Section> {
    buffers
        .into_iter()
        .filter(|b| !b.entries.is_empty())
        .map(|b| Section::freeze(b, markers, policy))
        .collect()
}
