pub mod classify;
pub mod extract;
pub mod markers;
pub mod sections;
pub mod source;

use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::Policy;
use crate::error::ProcessError;
use classify::Classifier;
use extract::Section;
use markers::Markers;
use sections::SectionSet;
use source::{LineSource, LogLine};

/// Result of one pass over a log.
#[derive(Debug, Clone)]
pub struct Run {
    pub sections: Vec<Section>,
    /// Lines that were decoded and classified.
    pub total_lines: usize,
    /// Lines dropped because they were not valid UTF-8.
    pub skipped_lines: usize,
}

impl Run {
    pub fn total_lines_read(&self) -> usize {
        self.total_lines + self.skipped_lines
    }

    pub fn total_insights(&self) -> usize {
        self.sections.iter().map(|s| s.insights.len()).sum()
    }
}

/// Single-pass pipeline: lines → categories → sections → scores and insights.
pub struct Pipeline {
    policy: Policy,
    classifier: Classifier,
    markers: Markers,
    shards: usize,
}

impl Pipeline {
    /// `shards > 1` splits every batch into that many line ranges that are
    /// aggregated in parallel and merged back in order.
    pub fn new(policy: Policy, shards: usize) -> Result<Self, ProcessError> {
        let classifier = Classifier::new(&policy)?;
        let markers = Markers::new(&policy.markers)?;
        Ok(Pipeline {
            policy,
            classifier,
            markers,
            shards: shards.max(1),
        })
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn run_source(&self, source: &LineSource, progress: &ProgressBar) -> Result<Run, ProcessError> {
        self.run(source.lines()?, progress)
    }

    pub fn run<I>(&self, lines: I, progress: &ProgressBar) -> Result<Run, ProcessError>
    where
        I: IntoIterator<Item = Result<LogLine, ProcessError>>,
    {
        let batch_lines = self.policy.batch_lines;
        let mut set = SectionSet::new();
        let mut batch = Vec::with_capacity(batch_lines);
        let mut skipped_lines = 0usize;

        for item in lines {
            match item {
                Ok(line) => {
                    progress.inc(line.text.len() as u64 + 1);
                    batch.push(line);
                    if batch.len() >= batch_lines {
                        let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_lines));
                        set.merge(self.aggregate(full));
                    }
                }
                Err(e) if !e.is_fatal() => {
                    warn!("Skipping line: {}", e);
                    skipped_lines += 1;
                }
                Err(e) => return Err(e),
            }
        }
        if !batch.is_empty() {
            set.merge(self.aggregate(batch));
        }

        let total_lines = set.total_entries();
        let sections = extract::finalize(set.into_buffers(), &self.markers, &self.policy);
        Ok(Run {
            sections,
            total_lines,
            skipped_lines,
        })
    }

    fn aggregate(&self, batch: Vec<LogLine>) -> SectionSet {
        if self.shards < 2 || batch.len() < self.shards * 2 {
            return self.aggregate_range(batch);
        }

        let chunk = batch.len().div_ceil(self.shards);
        let mut ranges = Vec::with_capacity(self.shards);
        let mut rest = batch;
        while rest.len() > chunk {
            let tail = rest.split_off(chunk);
            ranges.push(rest);
            rest = tail;
        }
        ranges.push(rest);
        debug!(ranges = ranges.len(), chunk, "Aggregating batch in parallel");

        let partials: Vec<SectionSet> = ranges
            .into_par_iter()
            .map(|range| self.aggregate_range(range))
            .collect();

        partials.into_iter().fold(SectionSet::new(), |mut acc, partial| {
            acc.merge(partial);
            acc
        })
    }

    fn aggregate_range(&self, lines: Vec<LogLine>) -> SectionSet {
        let mut set = SectionSet::new();
        for line in lines {
            let category = self.classifier.classify(&line);
            let signals = self.markers.signals(&line.text);
            set.push(category, line, &signals);
        }
        set
    }
}

// ── Tests ──
