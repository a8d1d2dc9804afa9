use regex::RegexSet;
use serde::{Deserialize, Serialize};

use super::source::LogLine;
use crate::config::{CategoryRule, Policy};
use crate::error::ProcessError;

/// Fixed set of topic sections. Declaration order is the output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionCategory {
    EmojiAnalysis,
    RagitWork,
    DatasetGeneration,
    CodeSnippets,
    TechnicalDiscussions,
    ResultsSummaries,
    ErrorHandling,
    FileOperations,
    GitOperations,
    CargoOperations,
    Uncategorized,
}

impl SectionCategory {
    pub const ALL: [SectionCategory; 11] = [
        SectionCategory::EmojiAnalysis,
        SectionCategory::RagitWork,
        SectionCategory::DatasetGeneration,
        SectionCategory::CodeSnippets,
        SectionCategory::TechnicalDiscussions,
        SectionCategory::ResultsSummaries,
        SectionCategory::ErrorHandling,
        SectionCategory::FileOperations,
        SectionCategory::GitOperations,
        SectionCategory::CargoOperations,
        SectionCategory::Uncategorized,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionCategory::EmojiAnalysis => "emoji_analysis",
            SectionCategory::RagitWork => "ragit_work",
            SectionCategory::DatasetGeneration => "dataset_generation",
            SectionCategory::CodeSnippets => "code_snippets",
            SectionCategory::TechnicalDiscussions => "technical_discussions",
            SectionCategory::ResultsSummaries => "results_summaries",
            SectionCategory::ErrorHandling => "error_handling",
            SectionCategory::FileOperations => "file_operations",
            SectionCategory::GitOperations => "git_operations",
            SectionCategory::CargoOperations => "cargo_operations",
            SectionCategory::Uncategorized => "uncategorized",
        }
    }

    /// Position in [`SectionCategory::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

struct CompiledRule {
    category: SectionCategory,
    patterns: RegexSet,
    min_emoji_density: Option<f64>,
}

impl CompiledRule {
    fn compile(rule: &CategoryRule) -> Result<Self, ProcessError> {
        // Compile one by one first so a bad pattern is reported by name.
        for p in &rule.patterns {
            regex::Regex::new(p)
                .map_err(|e| ProcessError::invalid_pattern(rule.category.as_str(), p, e))?;
        }
        let patterns = RegexSet::new(&rule.patterns).map_err(|e| {
            ProcessError::invalid_pattern(rule.category.as_str(), &rule.patterns.join(" | "), e)
        })?;
        Ok(CompiledRule {
            category: rule.category,
            patterns,
            min_emoji_density: rule.min_emoji_density,
        })
    }

    fn matches(&self, text: &str) -> bool {
        if self.patterns.is_match(text) {
            return true;
        }
        match self.min_emoji_density {
            Some(min) => emoji_density(text) >= min,
            None => false,
        }
    }
}

/// Ordered first-match rule table. Lines no rule claims are `Uncategorized`.
pub struct Classifier {
    rules: Vec<CompiledRule>,
}

impl Classifier {
    pub fn new(policy: &Policy) -> Result<Self, ProcessError> {
        let rules = policy
            .rules
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Classifier { rules })
    }

    pub fn classify(&self, line: &LogLine) -> SectionCategory {
        self.classify_text(&line.text)
    }

    pub fn classify_text(&self, text: &str) -> SectionCategory {
        self.rules
            .iter()
            .find(|r| r.matches(text))
            .map(|r| r.category)
            .unwrap_or(SectionCategory::Uncategorized)
    }
}

/// Pictographic characters over non-whitespace characters. Variation
/// selectors and zero-width joiners count toward neither side; a text symbol
/// followed by U+FE0F counts as an emoji.
pub fn emoji_density(text: &str) -> f64 {
    let mut emoji = 0usize;
    let mut visible = 0usize;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_whitespace() || is_emoji_component(c) {
            continue;
        }
        visible += 1;
        if is_emoji(c) || chars.peek() == Some(&'\u{FE0F}') {
            emoji += 1;
        }
    }
    if visible == 0 {
        0.0
    } else {
        emoji as f64 / visible as f64
    }
}

/// Characters drawn as emoji without a variation selector. Below U+1F000
/// only the Emoji_Presentation code points qualify, so CLI glyphs such as
/// `✓`, `✗` and `➜` stay text.
pub fn is_emoji(c: char) -> bool {
    matches!(c as u32,
        0x1F004 | 0x1F0CF
        | 0x1F18E | 0x1F191..=0x1F19A
        | 0x1F1E6..=0x1F1FF // regional indicators
        | 0x1F300..=0x1F5FF // symbols & pictographs
        | 0x1F600..=0x1F64F // emoticons
        | 0x1F680..=0x1F6FF // transport & map
        | 0x1F900..=0x1F9FF // supplemental symbols
        | 0x1FA70..=0x1FAFF // extended-A
        | 0x231A..=0x231B | 0x23E9..=0x23EC | 0x23F0 | 0x23F3
        | 0x25FD..=0x25FE
        | 0x2614..=0x2615 | 0x2648..=0x2653 | 0x267F | 0x2693 | 0x26A1
        | 0x26AA..=0x26AB | 0x26BD..=0x26BE | 0x26C4..=0x26C5 | 0x26CE
        | 0x26D4 | 0x26EA | 0x26F2..=0x26F3 | 0x26F5 | 0x26FA | 0x26FD
        | 0x2705 | 0x270A..=0x270B | 0x2728 | 0x274C | 0x274E
        | 0x2753..=0x2755 | 0x2757 | 0x2795..=0x2797 | 0x27B0 | 0x27BF
        | 0x2B1B..=0x2B1C | 0x2B50 | 0x2B55)
}

fn is_emoji_component(c: char) -> bool {
    matches!(c as u32, 0xFE0E | 0xFE0F | 0x200D | 0x1F3FB..=0x1F3FF)
}

// ── Tests ──
