//! Script input
//!
//! One command per line. Arguments are separated by whitespace or commas and
//! may be single or double quoted. `#` outside quotes starts a comment.
//!
//! ```text
//! create 't1', 'cf1'
//! grant "bob" RW t1   # read/write on t1
//! ```

use std::fs;
use std::path::Path;

use super::errors::{CliError, CliResult};

/// A parsed, non-empty script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    /// 1-based line number in the file
    pub number: usize,
    pub command: String,
    pub args: Vec<String>,
}

/// Split one line into words. Returns `None` for an unterminated quote.
pub fn tokenize(line: &str) -> Option<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for ch in line.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None => match ch {
                '\'' | '"' => {
                    quote = Some(ch);
                    in_word = true;
                }
                '#' => break,
                c if c.is_whitespace() || c == ',' => {
                    if in_word {
                        words.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                c => {
                    current.push(c);
                    in_word = true;
                }
            },
        }
    }

    if quote.is_some() {
        return None;
    }
    if in_word {
        words.push(current);
    }
    Some(words)
}

/// Parse script text, skipping blank and comment-only lines.
pub fn parse_script(text: &str) -> CliResult<Vec<ScriptLine>> {
    let mut lines = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let number = index + 1;
        let mut words = tokenize(line)
            .ok_or_else(|| CliError::parse_error(number, "unterminated quote"))?
            .into_iter();
        if let Some(command) = words.next() {
            lines.push(ScriptLine {
                number,
                command,
                args: words.collect(),
            });
        }
    }
    Ok(lines)
}

/// Read and parse a script file.
pub fn read_script(path: &Path) -> CliResult<Vec<ScriptLine>> {
    let text = fs::read_to_string(path).map_err(|e| {
        CliError::io_error(format!("Failed to read script {}: {}", path.display(), e))
    })?;
    parse_script(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_quotes_and_commas() {
        let words = tokenize("put 't1', 'r1', 'cf:a', 'hello world'").unwrap();
        assert_eq!(words, vec!["put", "t1", "r1", "cf:a", "hello world"]);
    }

    #[test]
    fn test_tokenize_comment_and_empty_quotes() {
        let words = tokenize("grant bob '' # nothing").unwrap();
        assert_eq!(words, vec!["grant", "bob", ""]);
    }

    #[test]
    fn test_hash_inside_quotes_is_kept() {
        assert_eq!(tokenize("put t r c:q 'a#b'").unwrap()[4], "a#b");
    }

    #[test]
    fn test_unterminated_quote() {
        assert!(tokenize("list 'ab").is_none());
    }

    #[test]
    fn test_parse_script_skips_blank_lines() {
        let lines = parse_script("# setup\n\ncreate t1 cf\n  list\n").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].number, 3);
        assert_eq!(lines[0].args, vec!["t1", "cf"]);
        assert_eq!(lines[1].command, "list");
    }

    #[test]
    fn test_parse_script_reports_line() {
        let err = parse_script("list\nlist \"x\n").unwrap_err();
        assert!(err.message().starts_with("line 2"));
    }
}
