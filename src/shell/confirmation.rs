//! Operator confirmation for destructive batch commands

use std::io::{self, BufRead, BufReader, Write};
use std::sync::{Arc, Mutex};

/// Asks the operator to approve an action on a set of items.
pub trait Confirmer: Send {
    /// Show `items` and `prompt`; `true` only on an affirmative answer.
    fn confirm(&mut self, prompt: &str, items: &[String]) -> bool;
}

/// Prompts on an output stream and reads the answer from an input stream.
///
/// `y` and `yes` (any case) approve; anything else, including end of input,
/// declines.
pub struct ConsoleConfirmer {
    input: Box<dyn BufRead + Send>,
    output: Box<dyn Write + Send>,
}

impl ConsoleConfirmer {
    pub fn new(input: Box<dyn BufRead + Send>, output: Box<dyn Write + Send>) -> Self {
        Self { input, output }
    }

    /// Prompt on stdout, answer on stdin.
    pub fn stdio() -> Self {
        Self::new(Box::new(BufReader::new(io::stdin())), Box::new(io::stdout()))
    }

    fn ask(&mut self, prompt: &str, items: &[String]) -> io::Result<bool> {
        for item in items {
            writeln!(self.output, "{}", item)?;
        }
        write!(self.output, "\n{} ", prompt)?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        let answer = answer.trim().to_ascii_lowercase();
        Ok(answer == "y" || answer == "yes")
    }
}

impl Confirmer for ConsoleConfirmer {
    fn confirm(&mut self, prompt: &str, items: &[String]) -> bool {
        self.ask(prompt, items).unwrap_or(false)
    }
}

/// Approves everything without prompting (`--yes`).
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Confirmer for AssumeYes {
    fn confirm(&mut self, _prompt: &str, _items: &[String]) -> bool {
        true
    }
}

/// One prompt shown to a [`RecordingConfirmer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationRequest {
    pub prompt: String,
    pub items: Vec<String>,
}

/// Gives a fixed answer and remembers every prompt. Clones share the record.
#[derive(Debug, Clone)]
pub struct RecordingConfirmer {
    answer: bool,
    requests: Arc<Mutex<Vec<ConfirmationRequest>>>,
}

impl RecordingConfirmer {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<ConfirmationRequest> {
        match self.requests.lock() {
            Ok(requests) => requests.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.requests().len()
    }
}

impl Confirmer for RecordingConfirmer {
    fn confirm(&mut self, prompt: &str, items: &[String]) -> bool {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(ConfirmationRequest {
                prompt: prompt.to_string(),
                items: items.to_vec(),
            });
        }
        self.answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn console(answer: &str) -> ConsoleConfirmer {
        ConsoleConfirmer::new(Box::new(Cursor::new(answer.as_bytes().to_vec())), Box::new(io::sink()))
    }

    #[test]
    fn test_console_accepts_yes() {
        assert!(console("y\n").confirm("Drop?", &["t1".into()]));
        assert!(console("YES\n").confirm("Drop?", &[]));
    }

    #[test]
    fn test_console_declines_anything_else() {
        assert!(!console("n\n").confirm("Drop?", &[]));
        assert!(!console("").confirm("Drop?", &[]));
        assert!(!console("yep\n").confirm("Drop?", &[]));
    }

    #[test]
    fn test_recording_confirmer_shares_requests() {
        let confirmer = RecordingConfirmer::answering(false);
        let mut boxed: Box<dyn Confirmer> = Box::new(confirmer.clone());
        assert!(!boxed.confirm("Disable the above 1 tables (y/n)?", &["a".into()]));
        assert_eq!(confirmer.prompt_count(), 1);
        assert_eq!(confirmer.requests()[0].items, vec!["a".to_string()]);
    }
}
