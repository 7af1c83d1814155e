use anyhow::Context;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Asks the user for input. `None` from `request_text` means the user
/// cancelled rather than submitting an empty answer.
pub trait Prompter {
    fn request_text(&mut self, prompt: &str, default: Option<&str>) -> Option<String>;
    fn confirm(&mut self, prompt: &str) -> bool;
    fn notify(&mut self, message: &str);
}

/// Line-edited prompts on the controlling terminal. A default is placed in
/// the edit buffer so it can be accepted with enter or changed in place.
pub struct TerminalPrompter {
    editor: DefaultEditor,
    assume_yes: bool,
}

impl TerminalPrompter {
    pub fn new(assume_yes: bool) -> anyhow::Result<Self> {
        let editor = DefaultEditor::new().context("failed to open the terminal for input")?;
        Ok(Self { editor, assume_yes })
    }

    fn read(&mut self, prompt: &str, initial: Option<&str>) -> Result<String, ReadlineError> {
        let prompt = format!("{prompt} ");
        match initial {
            Some(value) => self.editor.readline_with_initial(&prompt, (value, "")),
            None => self.editor.readline(&prompt),
        }
    }
}

impl Prompter for TerminalPrompter {
    fn request_text(&mut self, prompt: &str, default: Option<&str>) -> Option<String> {
        let line = self.read(prompt, default);
        answer_or_default(line, default)
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        let line = self.read(&format!("{prompt} [y/N]"), None);
        answer_or_default(line, None).is_some_and(|answer| is_affirmative(&answer))
    }

    fn notify(&mut self, message: &str) {
        println!("{message}");
    }
}

/// Ctrl-C and Ctrl-D cancel; a blank line takes the default when there is one.
fn answer_or_default(line: Result<String, ReadlineError>, default: Option<&str>) -> Option<String> {
    match line {
        Ok(answer) if answer.trim().is_empty() => {
            Some(default.map(str::to_string).unwrap_or(answer))
        }
        Ok(answer) => Some(answer),
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => None,
        Err(err) => {
            tracing::warn!(error = %err, "failed to read from terminal");
            None
        }
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// Answers prompts from a queue and records every notification.
    #[derive(Default)]
    pub(crate) struct ScriptedPrompter {
        pub answers: VecDeque<Option<String>>,
        pub confirmations: VecDeque<bool>,
        pub notices: Vec<String>,
        pub prompts: Vec<String>,
    }

    impl ScriptedPrompter {
        pub fn answering(answers: &[Option<&str>]) -> Self {
            Self {
                answers: answers.iter().map(|a| a.map(str::to_string)).collect(),
                ..Self::default()
            }
        }

        pub fn confirming(mut self, confirmations: &[bool]) -> Self {
            self.confirmations = confirmations.iter().copied().collect();
            self
        }
    }

    impl Prompter for ScriptedPrompter {
        fn request_text(&mut self, prompt: &str, default: Option<&str>) -> Option<String> {
            self.prompts.push(prompt.to_string());
            match self.answers.pop_front().flatten() {
                Some(answer) if answer.is_empty() => default.map(str::to_string).or(Some(answer)),
                other => other,
            }
        }

        fn confirm(&mut self, prompt: &str) -> bool {
            self.prompts.push(prompt.to_string());
            self.confirmations.pop_front().unwrap_or(false)
        }

        fn notify(&mut self, message: &str) {
            self.notices.push(message.to_string());
        }
    }

    #[test]
    fn blank_line_takes_default() {
        assert_eq!(
            answer_or_default(Ok("  ".to_string()), Some("2024-06-12")),
            Some("2024-06-12".to_string())
        );
        assert_eq!(answer_or_default(Ok(String::new()), None), Some(String::new()));
        assert_eq!(
            answer_or_default(Ok("Acme".to_string()), Some("Globex")),
            Some("Acme".to_string())
        );
    }

    #[test]
    fn interrupt_and_end_of_input_cancel() {
        assert_eq!(answer_or_default(Err(ReadlineError::Interrupted), Some("x")), None);
        assert_eq!(answer_or_default(Err(ReadlineError::Eof), None), None);
        let broken = ReadlineError::Io(std::io::Error::other("tty gone"));
        assert_eq!(answer_or_default(Err(broken), Some("x")), None);
    }

    #[test]
    fn confirm_requires_yes() {
        assert!(is_affirmative("y"));
        assert!(is_affirmative(" YES "));
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative(""));
    }
}
