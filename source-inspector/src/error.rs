/// A failed inspection.
///
/// Besides I/O and pattern errors, every variant is a failed expectation about the source and
/// carries the file and patterns involved.
#[derive(Debug, thiserror::Error, docsplay::Display)]
pub enum InspectionError {
    /// Source file not found: {file}
    FileNotFound { file: String },

    /// Failed to read {file}.
    Read {
        file: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid pattern.
    InvalidPattern(#[from] regex::Error),

    /// Pattern {pattern:?} NOT found in {file}
    PatternNotFound { file: String, pattern: String },

    /// Pattern {pattern:?} found in {file} at line {line}: {text}
    UnexpectedPattern {
        file: String,
        pattern: String,
        line: usize,
        text: String,
    },

    /// Text {text:?} NOT found in {file}
    TextNotFound { file: String, text: String },

    /// Text {text:?} found in {file} at line {line}: {line_text}
    UnexpectedText {
        file: String,
        text: String,
        line: usize,
        line_text: String,
    },

    /// First pattern {pattern:?} not found in {file}
    FirstPatternNotFound { file: String, pattern: String },

    /// Second pattern {pattern:?} not found in {file}
    SecondPatternNotFound { file: String, pattern: String },

    /// Expected {first:?} (line {first_line}) to appear before {second:?} (line {second_line}) in {file}
    OutOfOrder {
        file: String,
        first: String,
        first_line: usize,
        second: String,
        second_line: usize,
    },

    /// Anchor pattern {pattern:?} not found in {file}
    AnchorNotFound { file: String, pattern: String },

    /// No enclosing loop ('while'/'for') found before anchor {anchor:?} in {file}
    NoEnclosingLoop { file: String, anchor: String },

    /// No opening brace after the loop enclosing {anchor:?} (line {line}) in {file}
    NoOpeningBrace {
        file: String,
        anchor: String,
        line: usize,
    },

    /// Unmatched braces in {file}
    UnmatchedBraces { file: String },

    /// Pattern {required:?} not found in the same loop block as {anchor:?} in {file}
    NotInLoopBlock {
        file: String,
        anchor: String,
        required: String,
    },

    /// Pattern {pattern:?} in {file} has no capture group {group}.
    MissingGroup {
        file: String,
        pattern: String,
        group: usize,
    },

    /// Captured text {text:?} for {pattern:?} in {file} is not an integer.
    NotAnInteger {
        file: String,
        pattern: String,
        text: String,
        #[source]
        source: std::num::ParseIntError,
    },
}
