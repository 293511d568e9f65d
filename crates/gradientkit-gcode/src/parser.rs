//! G-Code line parser
//!
//! Turns raw lines into [`Record`]s. Only the handful of commands that matter
//! for position tracking and flow rewriting get semantic fields; everything
//! else is kept as a passthrough record.

use gradientkit_core::GcodeError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{debug, warn};

use super::{
    ExtrusionMode, LineEnding, Marker, Move, MoveKind, PositioningMode, Record, RecordKind,
    RecognizerHandle, SetPosition,
};

/// What to do with a line whose numeric fields cannot be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsePolicy {
    /// Abort the whole run
    #[default]
    Strict,
    /// Keep the line verbatim and report it
    Lenient,
}

/// Output of parsing a whole stream
#[derive(Debug, Clone, Default)]
pub struct ParsedStream {
    pub records: Vec<Record>,
    /// Lines kept verbatim under [`ParsePolicy::Lenient`]
    pub skipped: Vec<GcodeError>,
}

/// Split text into lines, remembering each line's terminator
pub fn split_lines(input: &str) -> impl Iterator<Item = (&str, LineEnding)> {
    input.split_inclusive('\n').map(|piece| {
        if let Some(text) = piece.strip_suffix("\r\n") {
            (text, LineEnding::CrLf)
        } else if let Some(text) = piece.strip_suffix('\n') {
            (text, LineEnding::Lf)
        } else {
            (piece, LineEnding::None)
        }
    })
}

fn number_regex() -> &'static Regex {
    static NUMBER_REGEX: OnceLock<Regex> = OnceLock::new();
    NUMBER_REGEX.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)$").expect("invalid regex pattern")
    })
}

fn word_regex() -> &'static Regex {
    static WORD_REGEX: OnceLock<Regex> = OnceLock::new();
    WORD_REGEX.get_or_init(|| Regex::new(r"\S+").expect("invalid regex pattern"))
}

/// Whitespace separated words with their byte offsets
fn words(code: &str) -> Vec<(usize, &str)> {
    word_regex()
        .find_iter(code)
        .map(|m| (m.start(), m.as_str()))
        .collect()
}

/// Split a command word such as `G01` into its letter and number
fn command_word(word: &str) -> Option<(char, u32)> {
    let mut chars = word.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let number = chars.as_str().parse::<u32>().ok()?;
    Some((letter, number))
}

/// G-Code parser driven by a slicer dialect
pub struct GcodeParser {
    recognizer: RecognizerHandle,
}

impl GcodeParser {
    /// Create a parser that uses `recognizer` for layer and type comments
    pub fn new(recognizer: RecognizerHandle) -> Self {
        Self { recognizer }
    }

    /// Parse a single line (without its terminator)
    pub fn parse_line(
        &self,
        line_number: usize,
        text: &str,
        ending: LineEnding,
    ) -> Result<Record, GcodeError> {
        let kind = self.classify(line_number, text)?;
        Ok(Record {
            line_number,
            text: text.to_string(),
            ending,
            kind,
        })
    }

    /// Parse a whole stream according to `policy`
    pub fn parse_stream(&self, input: &str, policy: ParsePolicy) -> Result<ParsedStream, GcodeError> {
        let mut stream = ParsedStream::default();

        for (index, (text, ending)) in split_lines(input).enumerate() {
            let line_number = index + 1;
            match self.parse_line(line_number, text, ending) {
                Ok(record) => stream.records.push(record),
                Err(err) => match policy {
                    ParsePolicy::Strict => return Err(err),
                    ParsePolicy::Lenient => {
                        warn!("Keeping malformed line verbatim: {}", err);
                        stream
                            .records
                            .push(Record::passthrough(line_number, text, ending));
                        stream.skipped.push(err);
                    }
                },
            }
        }

        debug!(
            "Parsed {} lines ({} skipped) with the {} dialect",
            stream.records.len(),
            stream.skipped.len(),
            self.recognizer.name()
        );
        Ok(stream)
    }

    fn classify(&self, line_number: usize, text: &str) -> Result<RecordKind, GcodeError> {
        let trimmed = text.trim_start();
        if trimmed.starts_with(';') {
            return Ok(match self.recognizer.classify(trimmed) {
                Marker::LayerChange => RecordKind::LayerChange,
                Marker::TypeChange(region) => RecordKind::TypeChange(region),
                Marker::None => RecordKind::Passthrough,
            });
        }

        let code = text.find(';').map_or(text, |pos| &text[..pos]);
        let mut words = words(code);
        // Skip an N line number
        if words.first().is_some_and(|(_, w)| {
            w.len() > 1 && w.starts_with(['N', 'n']) && w[1..].bytes().all(|b| b.is_ascii_digit())
        }) {
            words.remove(0);
        }
        let Some(&(_, first)) = words.first() else {
            return Ok(RecordKind::Passthrough);
        };

        let kind = match command_word(first) {
            Some(('G', 0)) => self.parse_move(line_number, MoveKind::Rapid, &words)?,
            Some(('G', 1)) => self.parse_move(line_number, MoveKind::Linear, &words)?,
            Some(('G', 2)) => self.parse_move(line_number, MoveKind::ArcCw, &words)?,
            Some(('G', 3)) => self.parse_move(line_number, MoveKind::ArcCcw, &words)?,
            Some(('G', 90)) => RecordKind::Positioning(PositioningMode::Absolute),
            Some(('G', 91)) => RecordKind::Positioning(PositioningMode::Relative),
            Some(('G', 92)) => self.parse_set_position(line_number, &words)?,
            Some(('M', 82)) => RecordKind::ExtrusionMode(ExtrusionMode::Absolute),
            Some(('M', 83)) => RecordKind::ExtrusionMode(ExtrusionMode::Relative),
            _ => RecordKind::Passthrough,
        };
        Ok(kind)
    }

    fn parse_value(line_number: usize, letter: char, value: &str) -> Result<f64, GcodeError> {
        if !number_regex().is_match(value) {
            return Err(GcodeError::MalformedCommand {
                line_number,
                reason: format!("invalid {} value '{}'", letter, value),
            });
        }
        value
            .parse::<f64>()
            .map_err(|e| GcodeError::MalformedCommand {
                line_number,
                reason: format!("invalid {} value '{}': {}", letter, value, e),
            })
    }

    fn parse_move(
        &self,
        line_number: usize,
        kind: MoveKind,
        words: &[(usize, &str)],
    ) -> Result<RecordKind, GcodeError> {
        let mut mv = Move {
            kind,
            x: None,
            y: None,
            z: None,
            e: None,
            f: None,
            e_span: None,
            f_span: None,
            code_end: words.last().map_or(0, |&(offset, word)| offset + word.len()),
        };

        for &(offset, word) in &words[1..] {
            let Some(letter) = word.chars().next().map(|c| c.to_ascii_uppercase()) else {
                continue;
            };
            if !matches!(letter, 'X' | 'Y' | 'Z' | 'E' | 'F') {
                continue;
            }
            let raw = &word[1..];
            let value = Self::parse_value(line_number, letter, raw)?;
            let span = offset + 1..offset + word.len();
            match letter {
                'X' => mv.x = Some(value),
                'Y' => mv.y = Some(value),
                'Z' => mv.z = Some(value),
                'E' => {
                    mv.e = Some(value);
                    mv.e_span = Some(span);
                }
                'F' => {
                    mv.f = Some(value);
                    mv.f_span = Some(span);
                }
                _ => {}
            }
        }

        Ok(RecordKind::Move(mv))
    }

    fn parse_set_position(
        &self,
        line_number: usize,
        words: &[(usize, &str)],
    ) -> Result<RecordKind, GcodeError> {
        let mut set = SetPosition::default();
        for &(_, word) in &words[1..] {
            let Some(letter) = word.chars().next().map(|c| c.to_ascii_uppercase()) else {
                continue;
            };
            if !matches!(letter, 'X' | 'Y' | 'Z' | 'E') {
                continue;
            }
            let value = Self::parse_value(line_number, letter, &word[1..])?;
            match letter {
                'X' => set.x = Some(value),
                'Y' => set.y = Some(value),
                'Z' => set.z = Some(value),
                _ => set.e = Some(value),
            }
        }
        Ok(RecordKind::SetPosition(set))
    }
}
