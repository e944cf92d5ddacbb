use std::fmt::Debug;
use std::io::{BufRead, Write};

/// A yes/no confirmation, the terminal counterpart of a confirm dialog.
pub trait Confirm: Send + Sync + Debug {
    /// Returns true when the user confirmed. Blocks until answered.
    fn confirm(&self, title: &str, message: &str) -> bool;
}

/// Always gives the same answer without asking.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirm for FixedAnswer {
    fn confirm(&self, title: &str, _message: &str) -> bool {
        tracing::debug!(title, answer = self.0, "Confirmation answered automatically");
        self.0
    }
}

/// Asks on stderr and reads the answer from stdin. Anything but `y`/`yes` cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl Confirm for TerminalPrompt {
    fn confirm(&self, title: &str, message: &str) -> bool {
        let mut stderr = std::io::stderr().lock();
        if write!(stderr, "{title}\n{message}\nConfirm? [y/N] ").and_then(|()| stderr.flush()).is_err() {
            return false;
        }
        drop(stderr);

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_affirmative(&answer)
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
