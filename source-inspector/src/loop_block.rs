//! Locating the loop body around a position in C source.
//!
//! This is a heuristic, not a parser. The innermost loop is taken to be the last `while` or `for`
//! keyword before the position, and its body runs from the next `{` to the brace that balances
//! it. Braces inside comments and string or character literals are counted like any other.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

fn loop_keyword() -> &'static Regex {
    static KEYWORD: OnceLock<Regex> = OnceLock::new();
    KEYWORD.get_or_init(|| Regex::new(r"\bwhile\b|\bfor\b").expect("pattern is valid"))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, docsplay::Display)]
pub enum LoopBlockError {
    /// No `while` or `for` keyword precedes the position.
    NoEnclosingLoop,
    /// The loop keyword at offset {keyword} is not followed by an opening brace.
    NoOpeningBrace { keyword: usize },
    /// The brace at offset {open} is never closed.
    UnmatchedBraces { open: usize },
}

/// Returns the byte range of the loop body enclosing `position`, braces included.
///
/// # Panics
///
/// Panics if `position` is not a character boundary of `content`.
///
/// ```
/// use source_inspector::enclosing_loop_block;
///
/// let source = "int main(void) { for (;;) { tick(); run(); } }";
/// let position = source.find("tick").unwrap();
/// let block = enclosing_loop_block(source, position).unwrap();
///
/// assert_eq!(&source[block], "{ tick(); run(); }");
/// ```
pub fn enclosing_loop_block(content: &str, position: usize) -> Result<Range<usize>, LoopBlockError> {
    let keyword = loop_keyword()
        .find_iter(&content[..position])
        .last()
        .ok_or(LoopBlockError::NoEnclosingLoop)?;

    let open = content[keyword.end()..]
        .find('{')
        .map(|offset| keyword.end() + offset)
        .ok_or(LoopBlockError::NoOpeningBrace {
            keyword: keyword.start(),
        })?;

    let mut depth = 0usize;
    for (offset, byte) in content.bytes().enumerate().skip(open) {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(open..offset + 1);
                }
            }
            _ => {}
        }
    }

    Err(LoopBlockError::UnmatchedBraces { open })
}
