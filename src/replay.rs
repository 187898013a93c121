//! Recorded arena snapshots, one JSON object per line.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::{ShopState, Snapshot};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read replay: {0}")]
    Io(#[from] io::Error),
    #[error("invalid snapshot on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode commands: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One recorded tick: the arena snapshot plus the shop state when it was
/// polled on that tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booster: Option<ShopState>,
}

/// Iterator over the frames of a replay. Blank lines are skipped.
pub struct ReplayReader<R> {
    lines: Lines<R>,
    line: usize,
}

impl<R: BufRead> ReplayReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }
}

impl ReplayReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, ReplayError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for ReplayReader<R> {
    type Item = Result<Frame, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(e) => return Some(Err(e.into())),
            };
            self.line += 1;
            if text.trim().is_empty() {
                continue;
            }
            let line = self.line;
            return Some(
                serde_json::from_str(&text).map_err(|source| ReplayError::Parse { line, source }),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::Position;

    #[test]
    fn test_reads_frames_and_skips_blank_lines() {
        let text = concat!(
            r#"{"map_size":[5,5],"round":"r1","bombers":[{"id":"a","pos":[0,2],"alive":true,"bombs_available":1}]}"#,
            "\n\n",
            r#"{"map_size":[5,5],"round":"r1","booster":{"available":[{"cost":2,"type":"speed"}],"state":{"points":4,"speed":1}}}"#,
            "\n",
        );
        let frames: Vec<Frame> = ReplayReader::new(text.as_bytes())
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].snapshot.units[0].pos, Position::new(0, 2));
        assert!(frames[0].booster.is_none());
        let shop = frames[1].booster.as_ref().unwrap();
        assert_eq!(shop.available[0].label, "speed");
        assert_eq!(shop.state.points, 4);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let text = "{\"map_size\":[5,5]}\n\nnot json\n";
        let results: Vec<_> = ReplayReader::new(text.as_bytes()).collect();
        assert!(results[0].is_ok());
        match &results[1] {
            Err(ReplayError::Parse { line, .. }) => assert_eq!(*line, 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ReplayReader::open(Path::new("/nonexistent/replay.jsonl"));
        assert!(matches!(result, Err(ReplayError::Io(_))));
    }
}
