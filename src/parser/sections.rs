use super::classify::SectionCategory;
use super::markers::LineSignals;
use super::source::LogLine;

/// Running sums over a section's lines. Merging two partial counters is
/// field-wise addition, so shards can be combined in any grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionCounters {
    pub entry_count: usize,
    pub byte_size: usize,
    pub technical_hits: usize,
    pub achievement_lines: usize,
    pub error_lines: usize,
    pub documented_lines: usize,
}

impl SectionCounters {
    pub fn observe(&mut self, text: &str, signals: &LineSignals) {
        self.entry_count += 1;
        self.byte_size += text.len();
        self.technical_hits += signals.technical_hits;
        self.achievement_lines += usize::from(signals.achievement);
        self.error_lines += usize::from(signals.error);
        self.documented_lines += usize::from(signals.documented);
    }

    pub fn merge(&mut self, other: &SectionCounters) {
        self.entry_count += other.entry_count;
        self.byte_size += other.byte_size;
        self.technical_hits += other.technical_hits;
        self.achievement_lines += other.achievement_lines;
        self.error_lines += other.error_lines;
        self.documented_lines += other.documented_lines;
    }

    pub fn error_fraction(&self) -> f64 {
        if self.entry_count == 0 {
            0.0
        } else {
            self.error_lines as f64 / self.entry_count as f64
        }
    }
}

/// A section still being filled.
#[derive(Debug, Clone)]
pub struct SectionBuffer {
    pub category: SectionCategory,
    pub entries: Vec<LogLine>,
    pub counters: SectionCounters,
}

impl SectionBuffer {
    fn new(category: SectionCategory) -> Self {
        SectionBuffer {
            category,
            entries: Vec::new(),
            counters: SectionCounters::default(),
        }
    }
}

/// One buffer per known category, in [`SectionCategory::ALL`] order.
#[derive(Debug, Clone)]
pub struct SectionSet {
    buffers: Vec<SectionBuffer>,
}

impl Default for SectionSet {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionSet {
    pub fn new() -> Self {
        SectionSet {
            buffers: SectionCategory::ALL.iter().map(|&c| SectionBuffer::new(c)).collect(),
        }
    }

    pub fn push(&mut self, category: SectionCategory, line: LogLine, signals: &LineSignals) {
        let buffer = &mut self.buffers[category.index()];
        buffer.counters.observe(&line.text, signals);
        buffer.entries.push(line);
    }

    /// Append `later` after this set. `later` must cover lines that come
    /// after every line already in `self`.
    pub fn merge(&mut self, later: SectionSet) {
        for (mine, theirs) in self.buffers.iter_mut().zip(later.buffers) {
            mine.counters.merge(&theirs.counters);
            mine.entries.extend(theirs.entries);
        }
    }

    #[cfg(test)]
    pub fn get(&self, category: SectionCategory) -> &SectionBuffer {
        &self.buffers[category.index()]
    }

    pub fn total_entries(&self) -> usize {
        self.buffers.iter().map(|b| b.counters.entry_count).sum()
    }

    pub fn into_buffers(self) -> Vec<SectionBuffer> {
        self.buffers
    }
}

// ── Tests ──
