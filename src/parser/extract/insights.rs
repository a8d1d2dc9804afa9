use crate::parser::markers::Markers;
use crate::parser::source::LogLine;

/// Entry texts that read as achievements, decisions or quantified results,
/// in log order. Every returned string is a verbatim entry text.
pub fn extract(entries: &[LogLine], markers: &Markers) -> Vec<String> {
    entries
        .iter()
        .filter(|e| markers.insight(&e.text).is_some())
        .map(|e| e.text.clone())
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Policy;

    fn entries(texts: &[&str]) -> Vec<LogLine> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| LogLine {
                line_number: i + 1,
                text: t.to_string(),
            })
            .collect()
    }

    #[test]
    fn keeps_log_order_and_text() {
        let m = Markers::new(&Policy::default().markers).unwrap();
        let lines = entries(&[
            "thinking about the parser",
            "✅ Successfully generated the dataset",
            "so what now",
            "Root cause: the buffer was shared",
            "indexed 17,817 emojis",
            "✅ Successfully generated the dataset",
        ]);
        let found = extract(&lines, &m);
        assert_eq!(
            found,
            vec![
                "✅ Successfully generated the dataset",
                "Root cause: the buffer was shared",
                "indexed 17,817 emojis",
                "✅ Successfully generated the dataset",
            ]
        );
        for f in &found {
            assert!(lines.iter().any(|l| &l.text == f));
        }
    }

    #[test]
    fn nothing_from_plain_chatter() {
        let m = Markers::new(&Policy::default().markers).unwrap();
        assert!(extract(&entries(&["hi", "let me check"]), &m).is_empty());
        assert!(extract(&[], &m).is_empty());
    }
}
