use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ProcessError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub line_number: usize,
    pub text: String,
}

/// A log file on disk. Every call to [`LineSource::lines`] starts over from
/// the first line.
#[derive(Debug, Clone)]
pub struct LineSource {
    path: PathBuf,
    len: u64,
}

impl LineSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ProcessError> {
        let path = path.as_ref().to_path_buf();
        let meta = std::fs::metadata(&path).map_err(|e| ProcessError::io(&path, e))?;
        if meta.is_dir() {
            return Err(ProcessError::io(
                &path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "is a directory"),
            ));
        }
        Ok(LineSource {
            path,
            len: meta.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes at open time.
    pub fn byte_len(&self) -> u64 {
        self.len
    }

    pub fn lines(&self) -> Result<Lines<BufReader<File>>, ProcessError> {
        let file = File::open(&self.path).map_err(|e| ProcessError::io(&self.path, e))?;
        Ok(Lines::new(BufReader::new(file), self.path.clone()))
    }
}

/// Streams lines out of any buffered reader, one allocation per line.
///
/// Invalid UTF-8 yields `Encoding` and iteration carries on with the next
/// line; a read failure yields `Io` and ends the iteration.
pub struct Lines<R> {
    reader: R,
    path: PathBuf,
    line_number: usize,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> Lines<R> {
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Lines {
            reader,
            path: path.into(),
            line_number: 0,
            buf: Vec::new(),
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for Lines<R> {
    type Item = Result<LogLine, ProcessError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                self.line_number += 1;
                let mut bytes = self.buf.as_slice();
                if let Some(rest) = bytes.strip_suffix(b"\n") {
                    bytes = rest;
                }
                if let Some(rest) = bytes.strip_suffix(b"\r") {
                    bytes = rest;
                }
                Some(match std::str::from_utf8(bytes) {
                    Ok(text) => Ok(LogLine {
                        line_number: self.line_number,
                        text: text.to_string(),
                    }),
                    Err(source) => Err(ProcessError::Encoding {
                        path: self.path.clone(),
                        line_number: self.line_number,
                        source,
                    }),
                })
            }
            Err(e) => {
                self.done = true;
                Some(Err(ProcessError::io(&self.path, e)))
            }
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor, Read};

    /// Serves `head` once, then fails every read.
    struct BrokenAfter {
        head: Option<Vec<u8>>,
    }

    impl Read for BrokenAfter {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.head.take() {
                Some(head) => {
                    buf[..head.len()].copy_from_slice(&head);
                    Ok(head.len())
                }
                None => Err(std::io::Error::new(std::io::ErrorKind::Other, "device went away")),
            }
        }
    }

    fn read(bytes: &[u8]) -> Vec<Result<LogLine, ProcessError>> {
        Lines::new(Cursor::new(bytes.to_vec()), "mem.log").collect()
    }

    #[test]
    fn numbers_lines_from_one() {
        let lines: Vec<_> = read(b"first\nsecond\r\nthird")
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].line_number, 1);
        assert_eq!(lines[1].text, "second");
        assert_eq!(lines[2].text, "third");
        assert_eq!(lines[2].line_number, 3);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(read(b"").is_empty());
    }

    #[test]
    fn blank_lines_are_kept() {
        let lines = read(b"\n\nx\n");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].as_ref().unwrap().text, "");
    }

    #[test]
    fn invalid_utf8_is_reported_and_skipped() {
        let lines = read(b"ok\n\xff\xfe bad\nstill ok\n");
        assert_eq!(lines.len(), 3);
        match &lines[1] {
            Err(ProcessError::Encoding { line_number, .. }) => assert_eq!(*line_number, 2),
            other => panic!("expected encoding error, got {:?}", other),
        }
        let last = lines[2].as_ref().unwrap();
        assert_eq!(last.line_number, 3);
        assert_eq!(last.text, "still ok");
    }

    #[test]
    fn read_failure_ends_iteration() {
        let reader = BufReader::new(BrokenAfter {
            head: Some(b"good line\n".to_vec()),
        });
        let mut lines = Lines::new(reader, "flaky.log");
        let first = lines.next().unwrap().unwrap();
        assert_eq!(first.line_number, 1);
        assert_eq!(first.text, "good line");
        match lines.next() {
            Some(Err(ProcessError::Io { path, .. })) => assert_eq!(path, PathBuf::from("flaky.log")),
            other => panic!("expected io error, got {:?}", other),
        }
        assert!(lines.next().is_none());
        assert!(lines.next().is_none());
    }

    #[test]
    fn source_restarts_from_first_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.log");
        std::fs::write(&path, "a\nb\n").unwrap();
        let source = LineSource::open(&path).unwrap();
        assert_eq!(source.byte_len(), 4);
        let first: Vec<_> = source.lines().unwrap().map(|l| l.unwrap()).collect();
        let second: Vec<_> = source.lines().unwrap().map(|l| l.unwrap()).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn missing_file_names_path() {
        let err = LineSource::open("no/such/session.log").unwrap_err();
        assert!(matches!(err, ProcessError::Io { .. }));
        assert!(err.to_string().contains("no/such/session.log"));
    }

    #[test]
    fn directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(LineSource::open(dir.path()).is_err());
    }
}
