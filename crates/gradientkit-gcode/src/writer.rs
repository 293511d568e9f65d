//! G-Code output
//!
//! Rewritten moves keep every byte of the original line except the numeric
//! text of the E and F words that changed. Synthesised lines use the line
//! ending of the record they are attached to.

use gradientkit_core::Point2;
use serde::{Deserialize, Serialize};
use std::ops::Range;

use super::{LineEnding, Move, Record};

/// Decimal places used when formatting values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormat {
    pub e_precision: usize,
    pub f_precision: usize,
    pub xy_precision: usize,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            e_precision: 5,
            f_precision: 0,
            xy_precision: 3,
        }
    }
}

/// One line of output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub text: String,
    pub ending: LineEnding,
}

impl OutputLine {
    pub fn new(text: impl Into<String>, ending: LineEnding) -> Self {
        Self {
            text: text.into(),
            ending,
        }
    }

    /// The record's text exactly as it was read
    pub fn verbatim(record: &Record) -> Self {
        Self::new(record.text.clone(), record.ending)
    }
}

/// Formats rewritten and synthesised G-code lines
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamWriter {
    format: NumberFormat,
}

impl StreamWriter {
    pub fn new(format: NumberFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> &NumberFormat {
        &self.format
    }

    pub fn format_e(&self, e: f64) -> String {
        format!("{:.*}", self.format.e_precision, e)
    }

    pub fn format_f(&self, f: f64) -> String {
        format!("{:.*}", self.format.f_precision, f)
    }

    pub fn format_xy(&self, v: f64) -> String {
        format!("{:.*}", self.format.xy_precision, v)
    }

    /// Replace the E and/or F value of `mv` inside `text`
    ///
    /// A new F on a move that had none is inserted after the last command
    /// word, ahead of any trailing comment. Everything else is left as is.
    pub fn rewrite_move(&self, text: &str, mv: &Move, e: Option<f64>, f: Option<f64>) -> String {
        let mut edits: Vec<(Range<usize>, String)> = Vec::with_capacity(2);
        if let (Some(e), Some(span)) = (e, mv.e_span.clone()) {
            edits.push((span, self.format_e(e)));
        }
        if let Some(f) = f {
            match mv.f_span.clone() {
                Some(span) => edits.push((span, self.format_f(f))),
                None => edits.push((mv.code_end..mv.code_end, format!(" F{}", self.format_f(f)))),
            }
        }

        // Apply right to left so earlier offsets stay valid
        edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));
        let mut out = text.to_string();
        for (span, replacement) in edits {
            out.replace_range(span, &replacement);
        }
        out
    }

    /// Rewrite a parsed record, keeping its line ending
    pub fn rewrite_record(&self, record: &Record, e: Option<f64>, f: Option<f64>) -> OutputLine {
        match record.as_move() {
            Some(mv) => OutputLine::new(self.rewrite_move(&record.text, mv, e, f), record.ending),
            None => OutputLine::verbatim(record),
        }
    }

    /// `G1 X.. Y.. E.. [F..]` for a synthesised piece of a subdivided move
    pub fn render_linear_move(&self, to: Point2, e: f64, f: Option<f64>) -> String {
        let mut line = format!(
            "G1 X{} Y{} E{}",
            self.format_xy(to.x),
            self.format_xy(to.y),
            self.format_e(e)
        );
        if let Some(f) = f {
            line.push_str(" F");
            line.push_str(&self.format_f(f));
        }
        line
    }

    /// `G1 F..` restoring a modal feed rate
    pub fn render_feed(&self, f: f64) -> String {
        format!("G1 F{}", self.format_f(f))
    }

    /// Concatenate lines with their own terminators
    pub fn join<'a>(lines: impl IntoIterator<Item = &'a OutputLine>) -> String {
        let mut out = String::new();
        for line in lines {
            out.push_str(&line.text);
            out.push_str(line.ending.as_str());
        }
        out
    }
}
