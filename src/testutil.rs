//! Test doubles for external tools and notifications.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::environment::process::{CommandRunner, ToolCommand, ToolOutput};
use crate::notify::{Notifier, Urgency};

struct Rule {
    pattern: String,
    outputs: VecDeque<ToolOutput>,
}

/// Records every command and answers from canned responses.
///
/// A command matches the first rule whose pattern occurs in its display
/// form. Queued outputs are consumed in order; the last one repeats.
/// Unmatched commands succeed with empty output. `python -m venv <root>`
/// also creates `<root>/bin/pip` and `<root>/bin/python` like the real tool.
pub(crate) struct RecordingRunner {
    calls: RefCell<Vec<ToolCommand>>,
    rules: RefCell<Vec<Rule>>,
    simulate_venv: bool,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            rules: RefCell::new(Vec::new()),
            simulate_venv: true,
        }
    }

    /// Queues an output for commands containing `pattern`.
    pub fn respond(&self, pattern: &str, output: ToolOutput) {
        let mut rules = self.rules.borrow_mut();
        match rules.iter_mut().find(|rule| rule.pattern == pattern) {
            Some(rule) => rule.outputs.push_back(output),
            None => rules.push(Rule {
                pattern: pattern.to_string(),
                outputs: VecDeque::from([output]),
            }),
        }
    }

    pub fn calls(&self) -> Vec<ToolCommand> {
        self.calls.borrow().clone()
    }

    /// Display form of every recorded command.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(ToString::to_string).collect()
    }

    /// Number of recorded commands containing `pattern`.
    pub fn count(&self, pattern: &str) -> usize {
        self.command_lines()
            .iter()
            .filter(|line| line.contains(pattern))
            .count()
    }

    fn venv_target(command: &ToolCommand) -> Option<PathBuf> {
        let args = command.arg_strings();
        match args.as_slice() {
            [m, venv, root] if m == "-m" && venv == "venv" => Some(PathBuf::from(root)),
            _ => None,
        }
    }
}

impl CommandRunner for RecordingRunner {
    fn output(&self, command: &ToolCommand) -> io::Result<ToolOutput> {
        self.calls.borrow_mut().push(command.clone());
        let line = command.to_string();

        let mut rules = self.rules.borrow_mut();
        if let Some(rule) = rules.iter_mut().find(|rule| line.contains(&rule.pattern)) {
            let output = if rule.outputs.len() > 1 {
                rule.outputs.pop_front().unwrap_or_default()
            } else {
                rule.outputs.front().cloned().unwrap_or_default()
            };
            return Ok(output);
        }

        if self.simulate_venv {
            if let Some(root) = Self::venv_target(command) {
                let bin = root.join("bin");
                fs::create_dir_all(&bin)?;
                fs::write(bin.join("pip"), "")?;
                fs::write(bin.join("python"), "")?;
            }
        }

        Ok(ToolOutput::success(""))
    }
}

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SentNotification {
    pub title: String,
    pub body: String,
    pub urgency: Urgency,
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    sent: RefCell<Vec<SentNotification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.borrow().clone()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.sent.borrow().iter().map(|n| n.body.clone()).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, title: &str, body: &str, urgency: Urgency) {
        self.sent.borrow_mut().push(SentNotification {
            title: title.to_string(),
            body: body.to_string(),
            urgency,
        });
    }
}
