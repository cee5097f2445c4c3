use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::GitError;
use crate::traits::GitOperations;

enum Reply {
    Output(String),
    Failure(String),
}

struct Rule {
    command: String,
    reply: Reply,
}

/// Recording git double for tests
///
/// Commands are matched against scripted rules by their space-joined
/// arguments: an exact match wins, otherwise the longest rule that is a
/// word-prefix of the command. Unmatched commands succeed with empty output.
pub struct ScriptedGit {
    workdir: PathBuf,
    rules: Vec<Rule>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedGit {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            rules: Vec::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// A double that answers the work-tree probe positively
    pub fn in_repo(workdir: impl Into<PathBuf>) -> Self {
        Self::new(workdir).respond("rev-parse --is-inside-work-tree", "true")
    }

    #[must_use]
    pub fn respond(mut self, command: &str, output: &str) -> Self {
        self.rules.push(Rule {
            command: command.to_string(),
            reply: Reply::Output(output.to_string()),
        });
        self
    }

    #[must_use]
    pub fn fail(mut self, command: &str, message: &str) -> Self {
        self.rules.push(Rule {
            command: command.to_string(),
            reply: Reply::Failure(message.to_string()),
        });
        self
    }

    /// Every command seen so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn was_called(&self, command: &str) -> bool {
        self.calls.borrow().iter().any(|call| call == command)
    }

    fn find_rule(&self, command: &str) -> Option<&Rule> {
        if let Some(rule) = self.rules.iter().rev().find(|rule| rule.command == command) {
            return Some(rule);
        }
        self.rules
            .iter()
            .filter(|rule| command.starts_with(&format!("{} ", rule.command)))
            .max_by_key(|rule| rule.command.len())
    }

    fn reply(&self, args: &[&str]) -> Result<String, GitError> {
        let command = args.join(" ");
        self.calls.borrow_mut().push(command.clone());

        match self.find_rule(&command).map(|rule| &rule.reply) {
            Some(Reply::Output(output)) => Ok(output.clone()),
            Some(Reply::Failure(message)) => Err(GitError::Failed {
                command,
                code: Some(1),
                message: message.clone(),
            }),
            None => Ok(String::new()),
        }
    }
}

impl GitOperations for ScriptedGit {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn run(&self, args: &[&str]) -> Result<String, GitError> {
        self.reply(args)
    }

    fn run_with_timeout(&self, args: &[&str], _timeout: Duration) -> Result<String, GitError> {
        self.reply(args)
    }

    fn run_interactive(&self, args: &[&str]) -> Result<(), GitError> {
        self.reply(args).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_rule_beats_prefix_rule() {
        let git = ScriptedGit::new("/tmp")
            .respond("status", "prefix")
            .respond("status --porcelain", "exact");

        assert_eq!(git.run(&["status", "--porcelain"]).ok().as_deref(), Some("exact"));
        assert_eq!(git.run(&["status", "--short"]).ok().as_deref(), Some("prefix"));
    }

    #[test]
    fn test_failure_rule_and_call_log() {
        let git = ScriptedGit::new("/tmp").fail("push", "rejected");

        let result = git.run(&["push", "origin", "main"]);
        assert!(matches!(result, Err(GitError::Failed { ref message, .. }) if message == "rejected"));
        assert!(git.run(&["pushx"]).is_ok());
        assert_eq!(git.calls(), vec!["push origin main", "pushx"]);
        assert!(git.was_called("push origin main"));
    }
}
