use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use tracing::warn;

use wfgen::contexts::AnswerCollector;
use wfgen::data::ClarificationAnswer;

const RULE_WIDTH: usize = 60;

/// Line-oriented conversation with the user.
///
/// Prompts go to `output` so stdout stays reserved for the generated script.
pub struct Console<R: BufRead, W: Write> {
    input: RefCell<R>,
    output: RefCell<W>,
}

impl Console<io::StdinLock<'static>, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: RefCell::new(input),
            output: RefCell::new(output),
        }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output.into_inner()
    }

    fn say(&self, text: &str) {
        let mut out = self.output.borrow_mut();
        // Prompt output is best effort
        let _ = writeln!(out, "{}", text);
    }

    /// Reads one answer; end of input and read errors give an empty answer
    fn ask(&self, prompt: &str) -> String {
        {
            let mut out = self.output.borrow_mut();
            let _ = write!(out, "{}", prompt);
            let _ = out.flush();
        }

        let mut line = String::new();
        if let Err(e) = self.input.borrow_mut().read_line(&mut line) {
            warn!("failed to read user input: {}", e);
            return String::new();
        }
        line.trim().to_string()
    }

    /// Asks for the workflow description. `None` when the user types `exit`.
    pub fn ask_request(&self) -> Option<String> {
        self.say("Describe the workflow script you want to generate.");
        self.say(
            "For example: 'Automatically assign issues to the team lead when they are created with a Critical priority.'",
        );
        self.say("Enter your request (type 'exit' to quit):");

        let request = self.ask("> ");
        if request.eq_ignore_ascii_case("exit") {
            return None;
        }
        Some(request)
    }

    /// Asks whether the script is acceptable.
    ///
    /// Returns the requested changes, or `None` when the user is satisfied or
    /// gives no change request.
    pub fn code_feedback(&self) -> Option<String> {
        self.say("");
        self.say("Is this script satisfactory? (yes/no)");
        let satisfied = self.ask("> ").to_lowercase().starts_with('y');
        if satisfied {
            return None;
        }

        self.say("What changes would you like to see in the script?");
        let changes = self.ask("> ");
        (!changes.is_empty()).then_some(changes)
    }
}

impl<R: BufRead, W: Write> AnswerCollector for Console<R, W> {
    fn collect(&self, questions: &[String]) -> Vec<ClarificationAnswer> {
        self.say("");
        self.say(&"=".repeat(RULE_WIDTH));
        self.say("Some details need clarification:");

        let answers = questions
            .iter()
            .enumerate()
            .map(|(i, question)| {
                self.say(&format!("\n{}. {}", i + 1, question));
                ClarificationAnswer::new(question.clone(), self.ask("> "))
            })
            .collect();

        self.say(&"=".repeat(RULE_WIDTH));
        answers
    }
}
