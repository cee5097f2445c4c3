use anyhow::Result;
use inquire::error::InquireError;
use inquire::{Confirm, MultiSelect, Password, PasswordDisplayMode, Select, Text, validator::Validation};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::error::Error;

/// Type alias for validation functions
pub type ValidatorFn = fn(&str) -> Result<Validation, Box<dyn Error + Send + Sync>>;

/// Answer to an interactive prompt
///
/// Pressing Esc or Ctrl+C is not an error: it yields `Cancelled`, which the
/// command turns into a clean exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt<T> {
    Answer(T),
    Cancelled,
}

impl<T> Prompt<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Prompt<U> {
        match self {
            Prompt::Answer(value) => Prompt::Answer(f(value)),
            Prompt::Cancelled => Prompt::Cancelled,
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Prompt::Cancelled)
    }
}

/// Trait for providing interactive selection functionality
/// This allows us to abstract away the interactive prompts for testing
pub trait SelectionProvider {
    /// Present a selection menu and return the user's choice
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be used for prompting
    fn select(&self, prompt: &str, options: Vec<String>) -> Result<Prompt<String>>;

    /// Present a checklist and return every ticked option
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be used for prompting
    fn multi_select(&self, prompt: &str, options: Vec<String>) -> Result<Prompt<Vec<String>>>;

    /// Ask a yes/no question
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be used for prompting
    fn confirm(&self, prompt: &str, default: bool) -> Result<Prompt<bool>>;

    /// Get text input from the user with validation
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be used for prompting
    fn get_text_input(
        &self,
        prompt: &str,
        default: Option<&str>,
        validator: Option<ValidatorFn>,
    ) -> Result<Prompt<String>>;

    /// Get masked input (tokens, passwords)
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be used for prompting
    fn get_secret(&self, prompt: &str, validator: Option<ValidatorFn>) -> Result<Prompt<String>>;
}

fn interpret<T>(result: Result<T, InquireError>) -> Result<Prompt<T>> {
    match result {
        Ok(value) => Ok(Prompt::Answer(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
            Ok(Prompt::Cancelled)
        }
        Err(e) => Err(e.into()),
    }
}

/// Real implementation using inquire for production use
pub struct RealSelectionProvider;

impl SelectionProvider for RealSelectionProvider {
    fn select(&self, prompt: &str, options: Vec<String>) -> Result<Prompt<String>> {
        interpret(
            Select::new(prompt, options)
                .with_page_size(10)
                .with_vim_mode(true)
                .prompt(),
        )
    }

    fn multi_select(&self, prompt: &str, options: Vec<String>) -> Result<Prompt<Vec<String>>> {
        interpret(
            MultiSelect::new(prompt, options)
                .with_page_size(15)
                .with_vim_mode(true)
                .prompt(),
        )
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<Prompt<bool>> {
        interpret(Confirm::new(prompt).with_default(default).prompt())
    }

    fn get_text_input(
        &self,
        prompt: &str,
        default: Option<&str>,
        validator: Option<ValidatorFn>,
    ) -> Result<Prompt<String>> {
        let mut text_prompt = Text::new(prompt);

        if let Some(initial) = default {
            text_prompt = text_prompt.with_initial_value(initial);
        }
        if let Some(validation_fn) = validator {
            text_prompt = text_prompt.with_validator(validation_fn);
        }

        interpret(text_prompt.prompt())
    }

    fn get_secret(&self, prompt: &str, validator: Option<ValidatorFn>) -> Result<Prompt<String>> {
        let mut secret_prompt = Password::new(prompt)
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked);

        if let Some(validation_fn) = validator {
            secret_prompt = secret_prompt.with_validator(validation_fn);
        }

        interpret(secret_prompt.prompt())
    }
}

/// A scripted answer for [`MockSelectionProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockAnswer {
    /// Answer for `select`, `get_text_input` or `get_secret`
    Text(String),
    Choices(Vec<String>),
    Confirm(bool),
    /// Behave like the user pressed Esc
    Cancel,
}

impl MockAnswer {
    pub fn text(value: impl Into<String>) -> Self {
        MockAnswer::Text(value.into())
    }
}

/// Mock implementation for testing that replays scripted answers in order
///
/// Any prompt beyond the script is an error, which makes "no prompt was
/// shown" easy to assert.
pub struct MockSelectionProvider {
    answers: RefCell<VecDeque<MockAnswer>>,
    prompts: RefCell<Vec<String>>,
}

impl MockSelectionProvider {
    pub fn new(answers: impl IntoIterator<Item = MockAnswer>) -> Self {
        Self {
            answers: RefCell::new(answers.into_iter().collect()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    /// A provider that fails on any prompt
    #[must_use]
    pub fn silent() -> Self {
        Self::new([])
    }

    /// Prompt messages shown so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.answers.borrow().len()
    }

    fn next(&self, prompt: &str) -> Result<MockAnswer> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("Unexpected prompt: {prompt}"))
    }

    fn next_text(&self, prompt: &str, validator: Option<ValidatorFn>) -> Result<Prompt<String>> {
        match self.next(prompt)? {
            MockAnswer::Text(value) => {
                if let Some(validate) = validator {
                    if let Validation::Invalid(reason) =
                        validate(&value).map_err(|e| anyhow::anyhow!(e.to_string()))?
                    {
                        anyhow::bail!("Mock input '{}' rejected: {:?}", value, reason);
                    }
                }
                Ok(Prompt::Answer(value))
            }
            MockAnswer::Cancel => Ok(Prompt::Cancelled),
            other => anyhow::bail!("Expected text answer for '{}', got {:?}", prompt, other),
        }
    }
}

impl SelectionProvider for MockSelectionProvider {
    fn select(&self, prompt: &str, options: Vec<String>) -> Result<Prompt<String>> {
        match self.next(prompt)? {
            MockAnswer::Text(response) if options.contains(&response) => {
                Ok(Prompt::Answer(response))
            }
            MockAnswer::Text(response) => {
                anyhow::bail!("Mock response '{}' not found in options", response)
            }
            MockAnswer::Cancel => Ok(Prompt::Cancelled),
            other => anyhow::bail!("Expected selection for '{}', got {:?}", prompt, other),
        }
    }

    fn multi_select(&self, prompt: &str, options: Vec<String>) -> Result<Prompt<Vec<String>>> {
        match self.next(prompt)? {
            MockAnswer::Choices(chosen) => {
                if let Some(missing) = chosen.iter().find(|choice| !options.contains(choice)) {
                    anyhow::bail!("Mock response '{}' not found in options", missing);
                }
                Ok(Prompt::Answer(chosen))
            }
            MockAnswer::Cancel => Ok(Prompt::Cancelled),
            other => anyhow::bail!("Expected choices for '{}', got {:?}", prompt, other),
        }
    }

    fn confirm(&self, prompt: &str, _default: bool) -> Result<Prompt<bool>> {
        match self.next(prompt)? {
            MockAnswer::Confirm(answer) => Ok(Prompt::Answer(answer)),
            MockAnswer::Cancel => Ok(Prompt::Cancelled),
            other => anyhow::bail!("Expected confirmation for '{}', got {:?}", prompt, other),
        }
    }

    fn get_text_input(
        &self,
        prompt: &str,
        _default: Option<&str>,
        validator: Option<ValidatorFn>,
    ) -> Result<Prompt<String>> {
        self.next_text(prompt, validator)
    }

    fn get_secret(&self, prompt: &str, validator: Option<ValidatorFn>) -> Result<Prompt<String>> {
        self.next_text(prompt, validator)
    }
}

/// Rejects blank input
///
/// # Errors
/// Never fails; invalid input is reported through `Validation::Invalid`
pub fn required(input: &str) -> Result<Validation, Box<dyn Error + Send + Sync>> {
    if input.trim().is_empty() {
        Ok(Validation::Invalid("This field cannot be empty.".into()))
    } else {
        Ok(Validation::Valid)
    }
}

/// Rejects input longer than 100 characters
///
/// # Errors
/// Never fails; invalid input is reported through `Validation::Invalid`
pub fn max_length_100(input: &str) -> Result<Validation, Box<dyn Error + Send + Sync>> {
    if input.chars().count() > 100 {
        Ok(Validation::Invalid(
            "Input exceeds maximum length of 100 characters.".into(),
        ))
    } else {
        Ok(Validation::Valid)
    }
}

/// Accepts empty input or a positive whole number
///
/// # Errors
/// Never fails; invalid input is reported through `Validation::Invalid`
pub fn optional_positive_number(input: &str) -> Result<Validation, Box<dyn Error + Send + Sync>> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.parse::<u32>().is_ok_and(|n| n > 0) {
        Ok(Validation::Valid)
    } else {
        Ok(Validation::Invalid("Please enter a positive number.".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_selection_provider_valid_response() -> Result<()> {
        let options = vec!["option1".to_string(), "option2".to_string()];
        let provider = MockSelectionProvider::new([MockAnswer::text("option1")]);

        let result = provider.select("Test prompt", options)?;
        assert_eq!(result, Prompt::Answer("option1".to_string()));
        assert_eq!(provider.prompts(), vec!["Test prompt"]);
        Ok(())
    }

    #[test]
    fn test_mock_selection_provider_invalid_response() {
        let options = vec!["option1".to_string(), "option2".to_string()];
        let provider = MockSelectionProvider::new([MockAnswer::text("invalid")]);

        assert!(provider.select("Test prompt", options).is_err());
    }

    #[test]
    fn test_mock_cancel_is_not_an_error() -> Result<()> {
        let provider = MockSelectionProvider::new([MockAnswer::Cancel]);
        assert!(provider.confirm("Continue?", true)?.is_cancelled());
        Ok(())
    }

    #[test]
    fn test_mock_runs_out_of_answers() {
        let provider = MockSelectionProvider::silent();
        let error = provider.get_text_input("Name:", None, None);
        assert!(error.is_err_and(|e| e.to_string().contains("Unexpected prompt: Name:")));
    }

    #[test]
    fn test_mock_applies_validator() {
        let provider = MockSelectionProvider::new([MockAnswer::text("   ")]);
        assert!(provider.get_text_input("Message:", None, Some(required)).is_err());
    }

    #[test]
    fn test_validators() -> std::result::Result<(), Box<dyn Error + Send + Sync>> {
        assert_eq!(required("x")?, Validation::Valid);
        assert!(matches!(required(" ")?, Validation::Invalid(_)));
        assert!(matches!(max_length_100(&"a".repeat(101))?, Validation::Invalid(_)));
        assert_eq!(optional_positive_number("")?, Validation::Valid);
        assert_eq!(optional_positive_number("3")?, Validation::Valid);
        assert!(matches!(optional_positive_number("0")?, Validation::Invalid(_)));
        Ok(())
    }

    #[test]
    fn test_prompt_map() {
        assert_eq!(Prompt::Answer(2).map(|n| n * 2), Prompt::Answer(4));
        assert_eq!(Prompt::<i32>::Cancelled.map(|n| n * 2), Prompt::Cancelled);
    }
}
