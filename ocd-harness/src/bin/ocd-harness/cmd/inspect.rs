use std::io::Write;
use std::path::{Path, PathBuf};

use source_inspector::SourceFile;

#[derive(clap::Parser)]
pub struct Cmd {
    #[clap(subcommand)]
    subcommand: Subcommand,
}

#[derive(clap::Subcommand)]
/// Static checks on a C source file
enum Subcommand {
    /// Fail unless PATTERN matches somewhere in FILE
    Contains { file: PathBuf, pattern: String },
    /// Fail if PATTERN matches anywhere in FILE
    Absent { file: PathBuf, pattern: String },
    /// Fail unless TEXT occurs literally in FILE
    ContainsText { file: PathBuf, text: String },
    /// Fail if TEXT occurs literally in FILE
    AbsentText { file: PathBuf, text: String },
    /// Print the number of matches of PATTERN in FILE
    Count { file: PathBuf, pattern: String },
    /// Print the lines of FILE matching PATTERN, trimmed
    Lines { file: PathBuf, pattern: String },
    /// Fail unless the first match of FIRST comes before the first match of SECOND
    Order {
        file: PathBuf,
        first: String,
        second: String,
    },
    /// Fail unless REQUIRED matches in the loop body around the first match of ANCHOR
    LoopContains {
        file: PathBuf,
        anchor: String,
        required: String,
    },
    /// Print the integer captured by PATTERN. `.` matches newlines.
    Extract {
        file: PathBuf,
        pattern: String,
        /// Capture group holding the number.
        #[arg(long, default_value_t = 1)]
        group: usize,
    },
}

impl Subcommand {
    fn file(&self) -> &Path {
        match self {
            Self::Contains { file, .. }
            | Self::Absent { file, .. }
            | Self::ContainsText { file, .. }
            | Self::AbsentText { file, .. }
            | Self::Count { file, .. }
            | Self::Lines { file, .. }
            | Self::Order { file, .. }
            | Self::LoopContains { file, .. }
            | Self::Extract { file, .. } => file,
        }
    }
}

impl Cmd {
    pub fn run(self) -> anyhow::Result<()> {
        self.run_with_output(std::io::stdout().lock())
    }

    fn run_with_output(self, mut output: impl Write) -> anyhow::Result<()> {
        let source = SourceFile::read(self.subcommand.file())?;

        match self.subcommand {
            Subcommand::Contains { pattern, .. } => source.should_contain_pattern(&pattern)?,
            Subcommand::Absent { pattern, .. } => source.should_not_contain_pattern(&pattern)?,
            Subcommand::ContainsText { text, .. } => source.should_contain_text(&text)?,
            Subcommand::AbsentText { text, .. } => source.should_not_contain_text(&text)?,
            Subcommand::Count { pattern, .. } => {
                writeln!(output, "{}", source.count_pattern_occurrences(&pattern)?)?;
            }
            Subcommand::Lines { pattern, .. } => {
                for line in source.matching_lines(&pattern)? {
                    writeln!(output, "{line}")?;
                }
            }
            Subcommand::Order { first, second, .. } => {
                source.first_occurrence_should_precede_second(&first, &second)?
            }
            Subcommand::LoopContains {
                anchor, required, ..
            } => source.same_loop_block_should_contain(&anchor, &required)?,
            Subcommand::Extract { pattern, group, .. } => {
                writeln!(output, "{}", source.extract_integer(&pattern, group)?)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use source_inspector::InspectionError;

    use super::*;

    const MAIN_C: &str = "\
#define TICK_LOOPS 480000UL

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

    fn inspect(args: &[&str]) -> anyhow::Result<String> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("main.c");
        std::fs::write(&path, MAIN_C)?;

        let (subcommand, rest) = args.split_first().expect("a subcommand");
        let path = path.display().to_string();
        let argv = ["inspect", *subcommand, path.as_str()]
            .into_iter()
            .chain(rest.iter().copied());

        let mut output = Vec::new();
        Cmd::try_parse_from(argv)?.run_with_output(&mut output)?;
        Ok(String::from_utf8(output)?)
    }

    #[test]
    fn checks_print_nothing() {
        assert_eq!(inspect(&["contains", r"Port_Init\(\)"]).unwrap(), "");
        assert_eq!(inspect(&["absent", "Dio_FlipChannel"]).unwrap(), "");
        assert_eq!(inspect(&["contains-text", "while (1)"]).unwrap(), "");
        assert_eq!(inspect(&["absent-text", "for ("]).unwrap(), "");
        assert_eq!(inspect(&["order", "Port_Init", "while"]).unwrap(), "");
        assert_eq!(
            inspect(&["loop-contains", "Os_WaitTick10ms", "SwcLedToggle_Run10ms"]).unwrap(),
            ""
        );
    }

    #[test]
    fn failed_checks_are_errors() {
        let error = inspect(&["absent", r"Swc\w+"]).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<InspectionError>(),
            Some(InspectionError::UnexpectedPattern { line: 9, .. })
        ));

        assert!(inspect(&["loop-contains", "Os_WaitTick10ms", "Port_Init"]).is_err());
        assert!(inspect(&["order", "while", "Port_Init"]).is_err());
    }

    #[test]
    fn results_are_printed() {
        assert_eq!(inspect(&["count", r"\(\);"]).unwrap(), "3\n");
        assert_eq!(
            inspect(&["lines", r"_Run|_Init"]).unwrap(),
            "Port_Init();\nSwcLedToggle_Run10ms();\n"
        );
        assert_eq!(
            inspect(&["extract", r"TICK_LOOPS\s+(\d+)"]).unwrap(),
            "480000\n"
        );
        assert_eq!(
            inspect(&["extract", r"(TICK)_LOOPS\s+(\d+)", "--group", "2"]).unwrap(),
            "480000\n"
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let cmd = Cmd::try_parse_from(["inspect", "contains", "/nonexistent/main.c", "main"]).unwrap();

        let error = cmd.run_with_output(Vec::new()).unwrap_err();
        assert_eq!(error.to_string(), "Source file not found: /nonexistent/main.c");
    }
}
