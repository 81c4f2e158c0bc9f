//! Static checks on C source files.
//!
//! Every check reads the file fresh and either passes or fails with an [`InspectionError`] that
//! names the file, the pattern, and where relevant the offending line. Patterns use the syntax of
//! the [`regex`] crate.
//!
//! ```no_run
//! # fn main() -> Result<(), source_inspector::InspectionError> {
//! use source_inspector::SourceFile;
//!
//! let main_c = SourceFile::read("src/main.c")?;
//!
//! main_c.should_contain_pattern(r"Os_WaitTick10ms\s*\(\s*\)")?;
//! main_c.same_loop_block_should_contain("Os_WaitTick10ms", "SwcLedToggle_Run10ms")?;
//! main_c.first_occurrence_should_precede_second("Port_Init", "Os_Init")?;
//! # Ok(())
//! # }
//! ```

mod error;
mod loop_block;
mod source;

use std::path::Path;

pub use error::InspectionError;
pub use loop_block::{enclosing_loop_block, LoopBlockError};
pub use source::SourceFile;

/// See [`SourceFile::should_contain_pattern`].
pub fn should_contain_pattern(path: impl AsRef<Path>, pattern: &str) -> Result<(), InspectionError> {
    SourceFile::read(path)?.should_contain_pattern(pattern)
}

/// See [`SourceFile::should_not_contain_pattern`].
pub fn should_not_contain_pattern(
    path: impl AsRef<Path>,
    pattern: &str,
) -> Result<(), InspectionError> {
    SourceFile::read(path)?.should_not_contain_pattern(pattern)
}

/// See [`SourceFile::should_contain_text`].
pub fn should_contain_text(path: impl AsRef<Path>, text: &str) -> Result<(), InspectionError> {
    SourceFile::read(path)?.should_contain_text(text)
}

/// See [`SourceFile::should_not_contain_text`].
pub fn should_not_contain_text(path: impl AsRef<Path>, text: &str) -> Result<(), InspectionError> {
    SourceFile::read(path)?.should_not_contain_text(text)
}

/// See [`SourceFile::count_pattern_occurrences`].
pub fn count_pattern_occurrences(
    path: impl AsRef<Path>,
    pattern: &str,
) -> Result<usize, InspectionError> {
    SourceFile::read(path)?.count_pattern_occurrences(pattern)
}

/// See [`SourceFile::matching_lines`].
pub fn matching_lines(path: impl AsRef<Path>, pattern: &str) -> Result<Vec<String>, InspectionError> {
    SourceFile::read(path)?.matching_lines(pattern)
}

/// See [`SourceFile::first_occurrence_should_precede_second`].
pub fn first_occurrence_should_precede_second(
    path: impl AsRef<Path>,
    first: &str,
    second: &str,
) -> Result<(), InspectionError> {
    SourceFile::read(path)?.first_occurrence_should_precede_second(first, second)
}

/// See [`SourceFile::same_loop_block_should_contain`].
pub fn same_loop_block_should_contain(
    path: impl AsRef<Path>,
    anchor: &str,
    required: &str,
) -> Result<(), InspectionError> {
    SourceFile::read(path)?.same_loop_block_should_contain(anchor, required)
}

/// See [`SourceFile::extract_integer`].
pub fn extract_integer(
    path: impl AsRef<Path>,
    pattern: &str,
    group: usize,
) -> Result<i64, InspectionError> {
    SourceFile::read(path)?.extract_integer(pattern, group)
}
