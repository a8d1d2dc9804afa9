use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::POLICY_VERSION;
use crate::error::ProcessError;
use crate::parser::classify::SectionCategory;
use crate::parser::extract::assess::QualityAssessment;
use crate::parser::extract::Section;
use crate::parser::source::LogLine;
use crate::parser::Run;

pub const SUMMARY_FILE: &str = "processing_summary.json";

/// One `<category>.json` document.
#[derive(Debug, Serialize)]
pub struct SectionDocument<'a> {
    pub category: SectionCategory,
    pub entry_count: usize,
    pub byte_size: usize,
    pub quality_score: f64,
    pub assessment: &'a QualityAssessment,
    pub insights: &'a [String],
    pub entries: &'a [LogLine],
}

impl<'a> From<&'a Section> for SectionDocument<'a> {
    fn from(s: &'a Section) -> Self {
        SectionDocument {
            category: s.category,
            entry_count: s.entries.len(),
            byte_size: s.byte_size,
            quality_score: s.quality_score,
            assessment: &s.assessment,
            insights: &s.insights,
            entries: &s.entries,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionStats {
    pub entry_count: usize,
    pub byte_size: usize,
    pub quality_score: f64,
    pub insight_count: usize,
    pub priority_tier: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityDistribution {
    pub tier1: usize,
    pub tier2: usize,
    pub tier3: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingSummary {
    pub policy_version: u32,
    pub source_file: String,
    pub total_lines: usize,
    pub total_lines_read: usize,
    pub skipped_lines: usize,
    pub total_sections: usize,
    pub total_insights: usize,
    pub quality_distribution: QualityDistribution,
    pub per_section: BTreeMap<SectionCategory, SectionStats>,
}

pub fn summarize(run: &Run, source_file: &str) -> ProcessingSummary {
    let mut distribution = QualityDistribution::default();
    let mut per_section = BTreeMap::new();

    for s in &run.sections {
        match s.assessment.priority_tier {
            1 => distribution.tier1 += 1,
            2 => distribution.tier2 += 1,
            _ => distribution.tier3 += 1,
        }
        per_section.insert(
            s.category,
            SectionStats {
                entry_count: s.entries.len(),
                byte_size: s.byte_size,
                quality_score: s.quality_score,
                insight_count: s.insights.len(),
                priority_tier: s.assessment.priority_tier,
            },
        );
    }

    ProcessingSummary {
        policy_version: POLICY_VERSION,
        source_file: source_file.to_string(),
        total_lines: run.total_lines,
        total_lines_read: run.total_lines_read(),
        skipped_lines: run.skipped_lines,
        total_sections: run.sections.len(),
        total_insights: run.total_insights(),
        quality_distribution: distribution,
        per_section,
    }
}

fn write_json<T: Serialize>(path: &Path, label: &str, value: &T) -> Result<(), ProcessError> {
    let mut json = serde_json::to_string_pretty(value).map_err(|e| ProcessError::Serialize {
        document: label.to_string(),
        source: e,
    })?;
    json.push('\n');
    fs::write(path, json).map_err(|e| ProcessError::io(path, e))
}

/// Write one document per populated section plus the summary, replacing
/// whatever a previous run left in `out_dir`. Returns the written paths.
pub fn write_reports(
    out_dir: &Path,
    run: &Run,
    summary: &ProcessingSummary,
) -> Result<Vec<PathBuf>, ProcessError> {
    fs::create_dir_all(out_dir).map_err(|e| ProcessError::io(out_dir, e))?;

    let mut written = Vec::with_capacity(run.sections.len() + 1);
    for section in &run.sections {
        let name = section.category.as_str();
        let path = out_dir.join(format!("{}.json", name));
        write_json(&path, name, &SectionDocument::from(section))?;
        info!("Saved {} entries to {}.json", section.entries.len(), name);
        written.push(path);
    }

    // Drop documents for categories this run did not populate.
    for category in SectionCategory::ALL {
        if run.sections.iter().any(|s| s.category == category) {
            continue;
        }
        let stale = out_dir.join(format!("{}.json", category.as_str()));
        if stale.exists() {
            fs::remove_file(&stale).map_err(|e| ProcessError::io(&stale, e))?;
            debug!("Removed stale {}", stale.display());
        }
    }

    let path = out_dir.join(SUMMARY_FILE);
    write_json(&path, "summary", summary)?;
    written.push(path);
    Ok(written)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Policy;
    use crate::parser::source::Lines;
    use crate::parser::Pipeline;
    use indicatif::ProgressBar;
    use std::io::Cursor;

    fn run_text(text: &str) -> Run {
        let pipeline = Pipeline::new(Policy::default(), 1).unwrap();
        let lines = Lines::new(Cursor::new(text.as_bytes().to_vec()), "mem.log");
        pipeline.run(lines, &ProgressBar::hidden()).unwrap()
    }

    const SCENARIO: &str = "git commit -m fix\n🔥🔥🔥 emoji overload\nERROR: panic at line 5\n";

    #[test]
    fn summary_counts() {
        let run = run_text(SCENARIO);
        let s = summarize(&run, "scenario.log");
        assert_eq!(s.total_lines, 3);
        assert_eq!(s.total_sections, 3);
        assert_eq!(s.skipped_lines, 0);
        assert_eq!(s.per_section.len(), 3);
        let errors = &s.per_section[&SectionCategory::ErrorHandling];
        assert_eq!(errors.entry_count, 1);
        assert!(errors.quality_score < 5.0);
        assert_eq!(
            s.quality_distribution.tier1 + s.quality_distribution.tier2 + s.quality_distribution.tier3,
            3
        );
    }

    #[test]
    fn writes_one_document_per_section() {
        let dir = tempfile::tempdir().unwrap();
        let run = run_text(SCENARIO);
        let written = write_reports(dir.path(), &run, &summarize(&run, "scenario.log")).unwrap();
        assert_eq!(written.len(), 4);
        for name in ["git_operations", "emoji_analysis", "error_handling"] {
            assert!(dir.path().join(format!("{}.json", name)).exists());
        }

        let doc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("git_operations.json")).unwrap()).unwrap();
        assert_eq!(doc["category"], "git_operations");
        assert_eq!(doc["entry_count"], 1);
        assert_eq!(doc["entries"][0]["line_number"], 1);
        assert_eq!(doc["entries"][0]["text"], "git commit -m fix");

        let summary: ProcessingSummary =
            serde_json::from_str(&fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap()).unwrap();
        assert_eq!(summary.total_sections, 3);
        assert!(summary.per_section.contains_key(&SectionCategory::GitOperations));
    }

    #[test]
    fn reruns_are_byte_identical() {
        let md = fs::read_to_string("tests/fixtures/session.log").unwrap();
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        for dir in [&a, &b] {
            let run = run_text(&md);
            write_reports(dir.path(), &run, &summarize(&run, "session.log")).unwrap();
        }
        let mut names: Vec<_> = fs::read_dir(a.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        names.sort();
        assert!(names.len() > 1);
        for name in names {
            let left = fs::read(a.path().join(&name)).unwrap();
            let right = fs::read(b.path().join(&name)).unwrap();
            assert_eq!(left, right, "{:?} differs", name);
        }
    }

    #[test]
    fn empty_run_writes_only_summary() {
        let dir = tempfile::tempdir().unwrap();
        let run = run_text("");
        let summary = summarize(&run, "empty.log");
        assert_eq!(summary.total_lines, 0);
        assert_eq!(summary.total_sections, 0);
        let written = write_reports(dir.path(), &run, &summary).unwrap();
        assert_eq!(written, vec![dir.path().join(SUMMARY_FILE)]);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn stale_documents_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let first = run_text(SCENARIO);
        write_reports(dir.path(), &first, &summarize(&first, "a.log")).unwrap();
        assert!(dir.path().join("git_operations.json").exists());

        let second = run_text("ERROR: again\n");
        write_reports(dir.path(), &second, &summarize(&second, "a.log")).unwrap();
        assert!(!dir.path().join("git_operations.json").exists());
        assert!(!dir.path().join("emoji_analysis.json").exists());
        assert!(dir.path().join("error_handling.json").exists());
    }

    #[test]
    fn unwritable_output_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("taken");
        fs::write(&blocker, "not a directory").unwrap();
        let run = run_text(SCENARIO);
        let err = write_reports(&blocker, &run, &summarize(&run, "a.log")).unwrap_err();
        assert!(matches!(err, ProcessError::Io { .. }));
        assert!(err.to_string().contains("taken"));
    }
}
