//! Turning command-line flags into exactly one action.
//!
//! Commands like `branch`, `auth`, `undo` and `unstage` accept several
//! mutually exclusive action flags. Each command describes its actions as an
//! enum implementing [`Action`] and collects the flags that were set as
//! candidates, in declaration order. [`resolve`] then:
//!
//! - prompts with a menu (and a follow-up argument prompt) when no flag is set
//! - takes the single candidate as is
//! - warns and asks to proceed with the first candidate when several are set
//!
//! `--verbose` is a global flag and never a candidate.

use anyhow::Result;
use thiserror::Error;

use crate::selection::{Prompt, SelectionProvider, required};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("invalid action '{0}'")]
    InvalidAction(String),

    #[error("{0} cannot be empty")]
    EmptyArgument(&'static str),
}

/// Follow-up prompt for an action that needs a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgumentPrompt {
    pub prompt: &'static str,
    /// Used in "<subject> cannot be empty"
    pub subject: &'static str,
}

/// One entry in a command's action menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub name: &'static str,
    pub label: &'static str,
    pub argument: Option<ArgumentPrompt>,
}

impl Choice {
    #[must_use]
    pub const fn plain(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            argument: None,
        }
    }

    #[must_use]
    pub const fn with_argument(
        name: &'static str,
        label: &'static str,
        prompt: &'static str,
        subject: &'static str,
    ) -> Self {
        Self {
            name,
            label,
            argument: Some(ArgumentPrompt { prompt, subject }),
        }
    }
}

pub trait Action: Sized {
    const MENU_PROMPT: &'static str;
    const CHOICES: &'static [Choice];

    /// Build the action for a menu entry
    ///
    /// # Errors
    /// Returns `ResolveError::InvalidAction` for names not in [`Action::CHOICES`]
    fn from_choice(name: &str, argument: Option<String>) -> Result<Self, ResolveError>;

    fn name(&self) -> &'static str;

    fn argument(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Resolution<A> {
    /// Nothing was requested on the command line
    Prompt,
    Selected(A),
    /// Several actions were requested; only `first` will run
    Ambiguous { first: A, ignored: Vec<&'static str> },
}

/// Pure classification of the candidate list
#[must_use]
pub fn classify<A: Action>(candidates: Vec<A>) -> Resolution<A> {
    let mut candidates = candidates.into_iter();
    let Some(first) = candidates.next() else {
        return Resolution::Prompt;
    };

    let ignored: Vec<&'static str> = candidates.map(|candidate| candidate.name()).collect();
    if ignored.is_empty() {
        Resolution::Selected(first)
    } else {
        Resolution::Ambiguous { first, ignored }
    }
}

/// Settle on one action, prompting where the flags leave it open
///
/// # Errors
/// Returns an error if a required argument is blank, the chosen menu entry
/// is unknown, or prompting fails
pub fn resolve<A: Action>(
    candidates: Vec<A>,
    provider: &dyn SelectionProvider,
) -> Result<Prompt<A>> {
    match classify(candidates) {
        Resolution::Prompt => prompt_for_action(provider),
        Resolution::Selected(action) => {
            check_argument(&action)?;
            Ok(Prompt::Answer(action))
        }
        Resolution::Ambiguous { first, ignored } => {
            println!(
                "⚠ Multiple actions specified, using the first ({}). Ignoring: {}",
                first.name(),
                ignored.join(", ")
            );
            let question = format!("Proceed with '{}'?", first.name());
            match provider.confirm(&question, true)? {
                Prompt::Answer(true) => {
                    check_argument(&first)?;
                    Ok(Prompt::Answer(first))
                }
                Prompt::Answer(false) | Prompt::Cancelled => Ok(Prompt::Cancelled),
            }
        }
    }
}

fn check_argument<A: Action>(action: &A) -> Result<(), ResolveError> {
    let Some(value) = action.argument() else {
        return Ok(());
    };
    if !value.trim().is_empty() {
        return Ok(());
    }

    let subject = A::CHOICES
        .iter()
        .find(|choice| choice.name == action.name())
        .and_then(|choice| choice.argument)
        .map_or("value", |argument| argument.subject);
    Err(ResolveError::EmptyArgument(subject))
}

fn prompt_for_action<A: Action>(provider: &dyn SelectionProvider) -> Result<Prompt<A>> {
    let labels = A::CHOICES
        .iter()
        .map(|choice| choice.label.to_string())
        .collect();

    let label = match provider.select(A::MENU_PROMPT, labels)? {
        Prompt::Answer(label) => label,
        Prompt::Cancelled => return Ok(Prompt::Cancelled),
    };

    let choice = A::CHOICES
        .iter()
        .find(|choice| choice.label == label)
        .ok_or_else(|| ResolveError::InvalidAction(label.clone()))?;

    let argument = match choice.argument {
        None => None,
        Some(argument) => match provider.get_text_input(argument.prompt, None, Some(required))? {
            Prompt::Answer(value) if value.trim().is_empty() => {
                return Err(ResolveError::EmptyArgument(argument.subject).into());
            }
            Prompt::Answer(value) => Some(value.trim().to_string()),
            Prompt::Cancelled => return Ok(Prompt::Cancelled),
        },
    };

    Ok(Prompt::Answer(A::from_choice(choice.name, argument)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{MockAnswer, MockSelectionProvider};

    #[derive(Debug, PartialEq, Eq)]
    enum Demo {
        List,
        Create(String),
    }

    impl Action for Demo {
        const MENU_PROMPT: &'static str = "What would you like to do?";
        const CHOICES: &'static [Choice] = &[
            Choice::plain("list", "List things"),
            Choice::with_argument("create", "Create a thing", "Name of the thing:", "thing name"),
        ];

        fn from_choice(name: &str, argument: Option<String>) -> Result<Self, ResolveError> {
            match name {
                "list" => Ok(Demo::List),
                "create" => Ok(Demo::Create(argument.unwrap_or_default())),
                other => Err(ResolveError::InvalidAction(other.to_string())),
            }
        }

        fn name(&self) -> &'static str {
            match self {
                Demo::List => "list",
                Demo::Create(_) => "create",
            }
        }

        fn argument(&self) -> Option<&str> {
            match self {
                Demo::Create(name) => Some(name),
                Demo::List => None,
            }
        }
    }

    #[test]
    fn test_single_candidate_is_used_without_prompting() -> Result<()> {
        let provider = MockSelectionProvider::silent();
        let resolved = resolve(vec![Demo::Create("x".to_string())], &provider)?;

        assert_eq!(resolved, Prompt::Answer(Demo::Create("x".to_string())));
        assert!(provider.prompts().is_empty());
        Ok(())
    }

    #[test]
    fn test_no_candidates_prompts_for_action_and_argument() -> Result<()> {
        let provider = MockSelectionProvider::new([
            MockAnswer::text("Create a thing"),
            MockAnswer::text("  widget "),
        ]);
        let resolved = resolve::<Demo>(vec![], &provider)?;

        assert_eq!(resolved, Prompt::Answer(Demo::Create("widget".to_string())));
        assert_eq!(
            provider.prompts(),
            vec!["What would you like to do?", "Name of the thing:"]
        );
        Ok(())
    }

    #[test]
    fn test_no_candidates_menu_cancel() -> Result<()> {
        let provider = MockSelectionProvider::new([MockAnswer::Cancel]);
        assert!(resolve::<Demo>(vec![], &provider)?.is_cancelled());
        Ok(())
    }

    #[test]
    fn test_multiple_candidates_declined_cancels() -> Result<()> {
        let provider = MockSelectionProvider::new([MockAnswer::Confirm(false)]);
        let resolved = resolve(vec![Demo::List, Demo::Create("x".to_string())], &provider)?;

        assert!(resolved.is_cancelled());
        assert_eq!(provider.prompts(), vec!["Proceed with 'list'?"]);
        Ok(())
    }

    #[test]
    fn test_multiple_candidates_accepted_uses_first() -> Result<()> {
        let provider = MockSelectionProvider::new([MockAnswer::Confirm(true)]);
        let resolved = resolve(vec![Demo::Create("a".to_string()), Demo::List], &provider)?;
        assert_eq!(resolved, Prompt::Answer(Demo::Create("a".to_string())));
        Ok(())
    }

    #[test]
    fn test_blank_argument_is_rejected() {
        let provider = MockSelectionProvider::silent();
        let error = resolve(vec![Demo::Create("  ".to_string())], &provider)
            .err()
            .map(|e| e.to_string());
        assert_eq!(error.as_deref(), Some("thing name cannot be empty"));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify::<Demo>(vec![]), Resolution::Prompt);
        assert_eq!(classify(vec![Demo::List]), Resolution::Selected(Demo::List));
        assert_eq!(
            classify(vec![Demo::List, Demo::Create("b".to_string())]),
            Resolution::Ambiguous {
                first: Demo::List,
                ignored: vec!["create"]
            }
        );
    }

    #[test]
    fn test_unknown_action_name() {
        assert_eq!(
            Demo::from_choice("explode", None),
            Err(ResolveError::InvalidAction("explode".to_string()))
        );
    }
}
