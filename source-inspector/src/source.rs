use std::path::Path;

use regex::{Regex, RegexBuilder};

use crate::loop_block::{enclosing_loop_block, LoopBlockError};
use crate::InspectionError;

/// The content of one source file, as read at a single point in time.
///
/// Checks never touch the file system again. The path-taking functions at the crate root read a
/// fresh snapshot for every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: String,
    content: String,
}

impl SourceFile {
    /// Reads a source file.
    ///
    /// A path that does not exist is reported as [`InspectionError::FileNotFound`].
    pub fn read(path: impl AsRef<Path>) -> Result<Self, InspectionError> {
        let path = path.as_ref();
        let file = path.display().to_string();

        if !path.exists() {
            return Err(InspectionError::FileNotFound { file });
        }

        let content = std::fs::read_to_string(path).map_err(|source| InspectionError::Read {
            file: file.clone(),
            source,
        })?;
        tracing::debug!("Read {} bytes from {}", content.len(), file);

        Ok(Self {
            path: file,
            content,
        })
    }

    /// Wraps source text that did not come from a file. `path` is only used in error messages.
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// The 1-based line number of a byte offset, and the trimmed text of that line.
    pub fn line_of(&self, offset: usize) -> (usize, &str) {
        let line = self.content[..offset].matches('\n').count() + 1;
        let text = self.content.lines().nth(line - 1).unwrap_or_default().trim();
        (line, text)
    }

    /// Passes if `pattern` matches anywhere in the file.
    pub fn should_contain_pattern(&self, pattern: &str) -> Result<(), InspectionError> {
        if compile(pattern)?.is_match(&self.content) {
            Ok(())
        } else {
            Err(InspectionError::PatternNotFound {
                file: self.path.clone(),
                pattern: pattern.to_string(),
            })
        }
    }

    /// Passes if `pattern` matches nowhere in the file. A failure names the first matching line.
    pub fn should_not_contain_pattern(&self, pattern: &str) -> Result<(), InspectionError> {
        let Some(found) = compile(pattern)?.find(&self.content) else {
            return Ok(());
        };

        let (line, text) = self.line_of(found.start());
        Err(InspectionError::UnexpectedPattern {
            file: self.path.clone(),
            pattern: pattern.to_string(),
            line,
            text: text.to_string(),
        })
    }

    /// Passes if `text` occurs literally. Regex metacharacters have no special meaning.
    pub fn should_contain_text(&self, text: &str) -> Result<(), InspectionError> {
        if self.content.contains(text) {
            Ok(())
        } else {
            Err(InspectionError::TextNotFound {
                file: self.path.clone(),
                text: text.to_string(),
            })
        }
    }

    /// Passes if `text` does not occur literally. A failure names the first line containing it.
    pub fn should_not_contain_text(&self, text: &str) -> Result<(), InspectionError> {
        let Some(offset) = self.content.find(text) else {
            return Ok(());
        };

        let (line, line_text) = self.line_of(offset);
        Err(InspectionError::UnexpectedText {
            file: self.path.clone(),
            text: text.to_string(),
            line,
            line_text: line_text.to_string(),
        })
    }

    /// Number of non-overlapping matches of `pattern` in the whole file.
    pub fn count_pattern_occurrences(&self, pattern: &str) -> Result<usize, InspectionError> {
        Ok(compile(pattern)?.find_iter(&self.content).count())
    }

    /// The trimmed lines matching `pattern`, in file order.
    pub fn matching_lines(&self, pattern: &str) -> Result<Vec<String>, InspectionError> {
        let regex = compile(pattern)?;

        Ok(self
            .content
            .lines()
            .filter(|line| regex.is_match(line))
            .map(|line| line.trim().to_string())
            .collect())
    }

    /// Passes if the first match of `first` starts before the first match of `second`.
    pub fn first_occurrence_should_precede_second(
        &self,
        first: &str,
        second: &str,
    ) -> Result<(), InspectionError> {
        let first_match = compile(first)?.find(&self.content).ok_or_else(|| {
            InspectionError::FirstPatternNotFound {
                file: self.path.clone(),
                pattern: first.to_string(),
            }
        })?;
        let second_match = compile(second)?.find(&self.content).ok_or_else(|| {
            InspectionError::SecondPatternNotFound {
                file: self.path.clone(),
                pattern: second.to_string(),
            }
        })?;

        if first_match.start() < second_match.start() {
            return Ok(());
        }

        Err(InspectionError::OutOfOrder {
            file: self.path.clone(),
            first: first.to_string(),
            first_line: self.line_of(first_match.start()).0,
            second: second.to_string(),
            second_line: self.line_of(second_match.start()).0,
        })
    }

    /// Passes if `required` matches inside the loop body enclosing the first match of `anchor`.
    ///
    /// See [`enclosing_loop_block`] for how the loop body is found.
    pub fn same_loop_block_should_contain(
        &self,
        anchor: &str,
        required: &str,
    ) -> Result<(), InspectionError> {
        let anchor_match = compile(anchor)?.find(&self.content).ok_or_else(|| {
            InspectionError::AnchorNotFound {
                file: self.path.clone(),
                pattern: anchor.to_string(),
            }
        })?;

        let block = enclosing_loop_block(&self.content, anchor_match.start()).map_err(|e| match e {
            LoopBlockError::NoEnclosingLoop => InspectionError::NoEnclosingLoop {
                file: self.path.clone(),
                anchor: anchor.to_string(),
            },
            LoopBlockError::NoOpeningBrace { keyword } => InspectionError::NoOpeningBrace {
                file: self.path.clone(),
                anchor: anchor.to_string(),
                line: self.line_of(keyword).0,
            },
            LoopBlockError::UnmatchedBraces { .. } => InspectionError::UnmatchedBraces {
                file: self.path.clone(),
            },
        })?;
        tracing::trace!("Loop block for {anchor:?} spans bytes {block:?}");

        if compile(required)?.is_match(&self.content[block]) {
            Ok(())
        } else {
            Err(InspectionError::NotInLoopBlock {
                file: self.path.clone(),
                anchor: anchor.to_string(),
                required: required.to_string(),
            })
        }
    }

    /// Parses capture `group` of the first match of `pattern` as an integer.
    ///
    /// `.` also matches newlines here, so a pattern can span lines.
    pub fn extract_integer(&self, pattern: &str, group: usize) -> Result<i64, InspectionError> {
        let regex = RegexBuilder::new(pattern)
            .dot_matches_new_line(true)
            .build()?;

        let captures =
            regex
                .captures(&self.content)
                .ok_or_else(|| InspectionError::PatternNotFound {
                    file: self.path.clone(),
                    pattern: pattern.to_string(),
                })?;

        let text = captures
            .get(group)
            .ok_or_else(|| InspectionError::MissingGroup {
                file: self.path.clone(),
                pattern: pattern.to_string(),
                group,
            })?
            .as_str();

        text.trim()
            .parse()
            .map_err(|source| InspectionError::NotAnInteger {
                file: self.path.clone(),
                pattern: pattern.to_string(),
                text: text.to_string(),
                source,
            })
    }
}

fn compile(pattern: &str) -> Result<Regex, InspectionError> {
    Ok(Regex::new(pattern)?)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const SCHEDULER: &str = "\
int main(void)
{
    Port_Init();

    while (1)
    {
        Os_WaitTick10ms();
        SwcLedToggle_Run10ms();
    }
}
";

    fn scheduler() -> SourceFile {
        SourceFile::new("main.c", SCHEDULER)
    }

    #[test_case(0, 1, "int main(void)"; "start of file")]
    #[test_case(22, 3, "Port_Init();"; "indented line")]
    #[test_case(SCHEDULER.len() - 1, 10, "}"; "last newline")]
    fn line_numbers(offset: usize, line: usize, text: &str) {
        assert_eq!(scheduler().line_of(offset), (line, text));
    }

    #[test]
    fn pattern_presence() {
        let file = scheduler();

        file.should_contain_pattern(r"Os_WaitTick10ms\(\)").unwrap();

        let error = file.should_contain_pattern(r"Dio_WriteChannel").unwrap_err();
        assert_eq!(
            error.to_string(),
            "Pattern \"Dio_WriteChannel\" NOT found in main.c"
        );
    }

    #[test]
    fn pattern_absence_names_the_line() {
        let file = scheduler();

        file.should_not_contain_pattern(r"0x4031[0-9A-F]{4}").unwrap();

        let error = file.should_not_contain_pattern(r"Swc\w+_Run").unwrap_err();
        assert_eq!(
            error.to_string(),
            "Pattern \"Swc\\\\w+_Run\" found in main.c at line 8: SwcLedToggle_Run10ms();"
        );
    }

    #[test]
    fn text_is_literal() {
        let file = scheduler();

        file.should_contain_text("Port_Init()").unwrap();
        assert!(matches!(
            file.should_contain_text("Port_Init(void)"),
            Err(InspectionError::TextNotFound { .. })
        ));

        file.should_not_contain_text("(volatile").unwrap();
        let error = file.should_not_contain_text("while (1)").unwrap_err();
        assert!(matches!(
            error,
            InspectionError::UnexpectedText { line: 5, ref line_text, .. } if line_text == "while (1)"
        ));
    }

    #[test]
    fn counting() {
        let file = scheduler();

        assert_eq!(file.count_pattern_occurrences(r"\w+\(\);").unwrap(), 3);
        assert_eq!(file.count_pattern_occurrences("Run10ms").unwrap(), 1);
        assert_eq!(file.count_pattern_occurrences("Dio_").unwrap(), 0);
        assert_eq!(
            SourceFile::new("x", "aaaa").count_pattern_occurrences("aa").unwrap(),
            2
        );
    }

    #[test]
    fn matching_lines_are_trimmed_and_ordered() {
        assert_eq!(
            scheduler().matching_lines(r"\(\);$").unwrap(),
            ["Port_Init();", "Os_WaitTick10ms();", "SwcLedToggle_Run10ms();"]
        );
        assert!(scheduler().matching_lines("nothing").unwrap().is_empty());
    }

    #[test]
    fn ordering() {
        let file = SourceFile::new("order.c", "B\nA");

        file.first_occurrence_should_precede_second("B", "A").unwrap();

        let error = file.first_occurrence_should_precede_second("A", "B").unwrap_err();
        assert_eq!(
            error.to_string(),
            "Expected \"A\" (line 2) to appear before \"B\" (line 1) in order.c"
        );
    }

    #[test]
    fn ordering_needs_both_patterns() {
        let file = scheduler();

        assert!(matches!(
            file.first_occurrence_should_precede_second("Missing", "Port_Init"),
            Err(InspectionError::FirstPatternNotFound { .. })
        ));
        assert!(matches!(
            file.first_occurrence_should_precede_second("Port_Init", "Missing"),
            Err(InspectionError::SecondPatternNotFound { .. })
        ));
    }

    #[test]
    fn same_match_does_not_precede_itself() {
        assert!(matches!(
            scheduler().first_occurrence_should_precede_second("Port", "Port_Init"),
            Err(InspectionError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn loop_block_containment() {
        let file = SourceFile::new("loop.c", "for(i=0;i<3;i++){ foo(); bar(); }");

        file.same_loop_block_should_contain("foo", "bar").unwrap();

        let error = file.same_loop_block_should_contain("foo", "baz").unwrap_err();
        assert_eq!(
            error.to_string(),
            "Pattern \"baz\" not found in the same loop block as \"foo\" in loop.c"
        );
    }

    #[test]
    fn loop_block_excludes_code_after_the_loop() {
        let file = scheduler();

        file.same_loop_block_should_contain("Os_WaitTick10ms", "SwcLedToggle_Run10ms")
            .unwrap();
        assert!(matches!(
            file.same_loop_block_should_contain("Os_WaitTick10ms", "Port_Init"),
            Err(InspectionError::NotInLoopBlock { .. })
        ));
    }

    #[test]
    fn loop_block_failures() {
        let file = scheduler();
        assert!(matches!(
            file.same_loop_block_should_contain("Missing", "Port_Init"),
            Err(InspectionError::AnchorNotFound { .. })
        ));
        assert!(matches!(
            file.same_loop_block_should_contain("Port_Init", "main"),
            Err(InspectionError::NoEnclosingLoop { .. })
        ));

        let no_brace = SourceFile::new("spin.c", "while (busy())\n    ;\nstep();");
        assert!(matches!(
            no_brace.same_loop_block_should_contain("step", "busy"),
            Err(InspectionError::NoOpeningBrace { line: 1, .. })
        ));

        let unbalanced = SourceFile::new("broken.c", "while (1) { step();");
        assert_eq!(
            unbalanced
                .same_loop_block_should_contain("step", "step")
                .unwrap_err()
                .to_string(),
            "Unmatched braces in broken.c"
        );
    }

    #[test]
    fn integer_extraction() {
        let file = SourceFile::new("tick.c", "for (i = 0; i < 500; i++)");

        assert_eq!(
            file.extract_integer(r"for\s*\(.*?=\s*0.*?<\s*(\d+)", 1)
                .unwrap(),
            500
        );
    }

    #[test]
    fn integer_extraction_spans_lines() {
        let file = SourceFile::new("tick.c", "for (i = 0;\n     i < 480000UL;\n     i++)");

        assert_eq!(
            file.extract_integer(r"for\s*\(.*?<\s*(\d+)", 1).unwrap(),
            480_000
        );
        assert_eq!(
            file.extract_integer(r"(for).*?(-?\d+)UL", 2).unwrap(),
            480_000
        );
    }

    #[test]
    fn integer_extraction_failures() {
        let file = SourceFile::new("tick.c", "#define TICKS (abc)");

        assert!(matches!(
            file.extract_integer(r"PERIOD\s+(\d+)", 1),
            Err(InspectionError::PatternNotFound { .. })
        ));
        assert!(matches!(
            file.extract_integer(r"TICKS", 1),
            Err(InspectionError::MissingGroup { group: 1, .. })
        ));
        assert!(matches!(
            file.extract_integer(r"TICKS \((\w+)\)", 1),
            Err(InspectionError::NotAnInteger { ref text, .. }) if text == "abc"
        ));
        assert!(file.extract_integer(r"TICKS", 0).is_err());
    }

    #[test]
    fn invalid_patterns_are_errors() {
        assert!(matches!(
            scheduler().should_contain_pattern("(unclosed"),
            Err(InspectionError::InvalidPattern(_))
        ));
    }
}
