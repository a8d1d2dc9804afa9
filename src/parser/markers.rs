use regex::{Regex, RegexSet};

use crate::config::MarkerPatterns;
use crate::error::ProcessError;

/// What one line contributes to its section's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineSignals {
    pub technical_hits: usize,
    pub achievement: bool,
    pub error: bool,
    pub documented: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightKind {
    Achievement,
    Decision,
    Quantified,
}

/// Compiled marker sets shared by the aggregator, scorer and extractor.
pub struct Markers {
    technical: Vec<Regex>,
    achievement: RegexSet,
    error: RegexSet,
    decision: RegexSet,
    quantified: RegexSet,
    documentation: RegexSet,
}

fn compile_set(scope: &str, patterns: &[String]) -> Result<RegexSet, ProcessError> {
    for p in patterns {
        Regex::new(p).map_err(|e| ProcessError::invalid_pattern(scope, p, e))?;
    }
    RegexSet::new(patterns).map_err(|e| ProcessError::invalid_pattern(scope, &patterns.join(" | "), e))
}

impl Markers {
    pub fn new(patterns: &MarkerPatterns) -> Result<Self, ProcessError> {
        let technical = patterns
            .technical
            .iter()
            .map(|p| Regex::new(p).map_err(|e| ProcessError::invalid_pattern("markers.technical", p, e)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Markers {
            technical,
            achievement: compile_set("markers.achievement", &patterns.achievement)?,
            error: compile_set("markers.error", &patterns.error)?,
            decision: compile_set("markers.decision", &patterns.decision)?,
            quantified: compile_set("markers.quantified", &patterns.quantified)?,
            documentation: compile_set("markers.documentation", &patterns.documentation)?,
        })
    }

    pub fn signals(&self, text: &str) -> LineSignals {
        LineSignals {
            technical_hits: self.technical.iter().map(|re| re.find_iter(text).count()).sum(),
            achievement: self.achievement.is_match(text),
            error: self.error.is_match(text),
            documented: self.documentation.is_match(text),
        }
    }

    /// First insight family the line belongs to, checked in the order
    /// achievement, decision, quantified.
    pub fn insight(&self, text: &str) -> Option<InsightKind> {
        if self.achievement.is_match(text) {
            Some(InsightKind::Achievement)
        } else if self.decision.is_match(text) {
            Some(InsightKind::Decision)
        } else if self.quantified.is_match(text) {
            Some(InsightKind::Quantified)
        } else {
            None
        }
    }
}

// ── Tests ──
