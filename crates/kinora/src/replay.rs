//! # Event Replay
//!
//! Reads recorded events, one JSON [`EventEnvelope`] per line.
//!
//! ```text
//! {"transaction_hash":"0x..","log_index":0,"block_number":1,"block_timestamp":12,
//!  "event":{"event":"QuestCompleted","params":{"quest_id":"0x5","player_profile_id":"0x9"}}}
//! ```
//!
//! Blank lines are ignored.

use std::io::BufRead;

use kinora_shared::EventEnvelope;

use crate::error::{AppError, AppResult};

/// Iterator over the envelopes of an NDJSON stream.
pub struct EventReader<R> {
    lines: std::io::Lines<R>,
    line: usize,
}

impl<R: BufRead> EventReader<R> {
    /// Reads envelopes from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }
}

impl<R: BufRead> Iterator for EventReader<R> {
    type Item = AppResult<EventEnvelope>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line += 1;
            let line = match line {
                Ok(line) => line,
                Err(source) => return Some(Err(AppError::ReadEvents { source })),
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(serde_json::from_str(&line).map_err(|source| AppError::Replay {
                line: self.line,
                source,
            }));
        }
    }
}
