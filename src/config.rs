use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::parser::classify::SectionCategory;

/// Bump when the meaning of a rule, marker or weight changes, so emitted
/// reports can be traced back to the policy that produced them.
pub const POLICY_VERSION: u32 = 1;

const ENV_PREFIX: &str = "LOGSECT";

/// Classifier rules, marker sets and scoring weights for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub version: u32,
    /// Lines read per batch before the batch is aggregated.
    pub batch_lines: usize,
    /// Evaluated in order; the first matching rule wins.
    pub rules: Vec<CategoryRule>,
    pub markers: MarkerPatterns,
    pub scoring: ScoreWeights,
    pub tiers: TierThresholds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: SectionCategory,
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Also match when the share of emoji among non-whitespace chars reaches this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_emoji_density: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerPatterns {
    /// Every occurrence counts toward the technical bonus.
    pub technical: Vec<String>,
    pub achievement: Vec<String>,
    pub error: Vec<String>,
    pub decision: Vec<String>,
    pub quantified: Vec<String>,
    pub documentation: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub baseline: f64,
    pub technical_weight: f64,
    pub technical_cap: f64,
    pub achievement_weight: f64,
    pub achievement_cap: f64,
    pub error_weight: f64,
    /// Error fraction above which the steep penalty kicks in.
    pub error_threshold: f64,
    pub error_steep_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub tier1: TierBound,
    pub tier2: TierBound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierBound {
    pub min_technical_depth: u8,
    pub min_documentation: u8,
    /// Exclusive.
    pub max_error_rate: f64,
}

/// "failed" counts unless a bare zero precedes it, as in "3 passed; 0 failed".
const FAILED: &str = r"(?i)(?:^|[^\s\d])\s*\bfailed\b";
const FAILED_COUNT: &str = r"(?i)\b[1-9]\d*\s+failed\b";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn rule(category: SectionCategory, patterns: &[&str]) -> CategoryRule {
    CategoryRule {
        category,
        patterns: strings(patterns),
        min_emoji_density: None,
    }
}

impl Default for Policy {
    fn default() -> Self {
        use SectionCategory::*;

        let mut emoji = rule(EmojiAnalysis, &[r"(?i)\bemojis?\b"]);
        emoji.min_emoji_density = Some(0.15);

        Policy {
            version: POLICY_VERSION,
            batch_lines: 8192,
            rules: vec![
                rule(
                    ErrorHandling,
                    &[
                        r"(?i)\berrors?\b",
                        r"error\[E\d{4}\]",
                        r"(?i)\bfail(ure|s)?\b",
                        FAILED,
                        FAILED_COUNT,
                        r"(?i)\bpanic(ked|s)?\b",
                        r"(?i)\bexception\b",
                    ],
                ),
                rule(
                    GitOperations,
                    &[r"\bgit\s+(add|commit|push|pull|clone|status|branch|remote|init|checkout|merge|rebase|log|diff|fetch|tag|stash|reset)\b"],
                ),
                rule(
                    CargoOperations,
                    &[r"\bcargo\s+(run|build|test|check|clippy|fmt|install|add|bench|doc|new|update)\b"],
                ),
                rule(
                    FileOperations,
                    &[
                        r"\bfs_(read|write)\b",
                        r"Reading (directory|file)",
                        r"Creating file",
                        r"\b(mkdir|touch|rm|mv|cp)\s+\S",
                    ],
                ),
                rule(
                    CodeSnippets,
                    &[
                        r"```",
                        r"^\s*(pub(\(crate\))?\s+)?(fn|struct|enum|impl|trait|mod|use)\s",
                        r"\bfn\s+\w+\s*[(<]",
                        r"\blet\s+(mut\s+)?\w+\s*(:[^=]+)?=",
                    ],
                ),
                rule(
                    ResultsSummaries,
                    &[
                        r"^#{2,3}\s.*\b(Results|Summary)\b",
                        r"\bSUMMARY\b",
                        r"Results:",
                        "📊|🏆|✅",
                    ],
                ),
                rule(
                    RagitWork,
                    &[r"(?i)\b(ragit|solfunmeme|clifford|multivector|term_quiz_master)"],
                ),
                rule(
                    DatasetGeneration,
                    &[r"(?i)\b(datasets?|jsonl|parquet|hugging\s*face)\b"],
                ),
                emoji,
                rule(
                    TechnicalDiscussions,
                    &[
                        r"[⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏] Thinking",
                        "🛠️",
                        r"Using tool",
                        r"✓ Successfully",
                        r"(?i)\b(architecture|design|approach|trade-?offs?|refactor(ing)?)\b",
                    ],
                ),
            ],
            markers: MarkerPatterns {
                technical: strings(&[
                    r"\b(impl|struct|trait|enum|fn|async|lifetime|generic|closure|iterator)\b",
                    r"(?i)\b(algorithm|tensor|lambda|clifford|multivector|parser|regex|benchmark|serde|rayon|tokio)\b",
                ]),
                achievement: strings(&[
                    "✅|🎉|🏆",
                    r"(?i)\bsuccessfully\b",
                    r"(?i)\b(completed?|finished|passed|works now)\b",
                ]),
                error: strings(&[
                    r"(?i)\berrors?\b",
                    r"(?i)\bfail(ure|s)?\b",
                    FAILED,
                    FAILED_COUNT,
                    r"(?i)\bpanic(ked|s)?\b",
                    r"(?i)\bexception\b",
                ]),
                decision: strings(&[
                    r"(?i)\b(decided|decision|resolved|solution|root cause|fixed by|going with|switched to)\b",
                ]),
                quantified: strings(&[
                    r"(?i)\b\d[\d,.]*\s*(%|ms\b|seconds?\b|lines\b|records\b|entries\b|files\b|tests\b|insights\b|emojis\b|[kmg]b\b|x\b)",
                ]),
                documentation: strings(&[r"^\s*#{1,6}\s", r"//", r"/\*"]),
            },
            scoring: ScoreWeights {
                baseline: 5.0,
                technical_weight: 0.25,
                technical_cap: 2.0,
                achievement_weight: 0.5,
                achievement_cap: 2.5,
                error_weight: 3.0,
                error_threshold: 0.3,
                error_steep_weight: 6.0,
            },
            tiers: TierThresholds {
                tier1: TierBound {
                    min_technical_depth: 8,
                    min_documentation: 7,
                    max_error_rate: 0.2,
                },
                tier2: TierBound {
                    min_technical_depth: 6,
                    min_documentation: 5,
                    max_error_rate: 0.4,
                },
            },
        }
    }
}

impl Policy {
    /// Check the invariants the classifier and scorer rely on.
    pub fn validate(&self) -> Result<()> {
        if self.version != POLICY_VERSION {
            bail!(
                "policy version {} is not supported (expected {})",
                self.version,
                POLICY_VERSION
            );
        }
        if self.batch_lines == 0 {
            bail!("batch_lines must be at least 1");
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.category) {
                bail!("duplicate rule for {}", rule.category.as_str());
            }
            if let Some(density) = rule.min_emoji_density {
                if !(density.is_finite() && density > 0.0 && density <= 1.0) {
                    bail!(
                        "min_emoji_density for {} must be in (0, 1], got {}",
                        rule.category.as_str(),
                        density
                    );
                }
            }
        }

        let s = &self.scoring;
        let weights = [
            ("baseline", s.baseline),
            ("technical_weight", s.technical_weight),
            ("technical_cap", s.technical_cap),
            ("achievement_weight", s.achievement_weight),
            ("achievement_cap", s.achievement_cap),
            ("error_weight", s.error_weight),
            ("error_threshold", s.error_threshold),
            ("error_steep_weight", s.error_steep_weight),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                bail!("scoring.{} must be a finite non-negative number, got {}", name, value);
            }
        }
        if s.baseline > 10.0 || s.error_threshold > 1.0 {
            bail!("scoring.baseline must be <= 10 and scoring.error_threshold <= 1");
        }
        Ok(())
    }
}

/// Built-in defaults, overlaid by an optional policy file, then by
/// `LOGSECT_*` environment variables (`__` separates nested keys).
pub fn load(path: Option<&Path>) -> Result<Policy> {
    let mut builder = ::config::Config::builder()
        .add_source(::config::Config::try_from(&Policy::default()).context("Failed to encode default policy")?);

    if let Some(path) = path {
        if !path.exists() {
            bail!("policy file {} does not exist", path.display());
        }
        builder = builder.add_source(::config::File::from(path));
    }

    let policy: Policy = builder
        .add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to load policy")?
        .try_deserialize()
        .context("Failed to parse policy")?;

    policy.validate()?;
    Ok(policy)
}

// ── Tests ──
