use anyhow::{Context, Result};
use clap::Args;
use inquire::validator::Validation;
use std::error::Error;
use std::io::Read;
use tracing::{debug, warn};

use crate::commands::Outcome;
use crate::context::AppContext;
use crate::format::heading;
use crate::github::{UserSummary, is_valid_token_format};
use crate::resolver::{Action, Choice, ResolveError, resolve};
use crate::selection::{RealSelectionProvider, SelectionProvider};
use crate::storage::{ConfigStore, Credential, ENV_TOKEN_KEY, ENV_USER_KEY};
use crate::traits::GithubApi;

const NOT_LOGGED_IN: &str = "Not logged in. Run `glc auth --login` to connect your GitHub account.";

#[derive(Debug, Default, Clone, Args)]
pub struct AuthFlags {
    /// Log in with a personal access token
    #[arg(short, long)]
    pub login: bool,
    /// Remove the stored token
    #[arg(short = 'o', long)]
    pub logout: bool,
    /// Show the stored account details
    #[arg(short, long)]
    pub show_all: bool,
    /// Read the token from stdin instead of prompting (implies --login)
    #[arg(long)]
    pub with_token: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    Login,
    Logout,
    ShowAll,
}

impl Action for AuthAction {
    const MENU_PROMPT: &'static str = "What do you want to do?";
    const CHOICES: &'static [Choice] = &[
        Choice::plain("login", "Log in to GitHub"),
        Choice::plain("logout", "Log out"),
        Choice::plain("show-all", "Show the stored account"),
    ];

    fn from_choice(name: &str, _argument: Option<String>) -> Result<Self, ResolveError> {
        match name {
            "login" => Ok(AuthAction::Login),
            "logout" => Ok(AuthAction::Logout),
            "show-all" => Ok(AuthAction::ShowAll),
            other => Err(ResolveError::InvalidAction(other.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AuthAction::Login => "login",
            AuthAction::Logout => "logout",
            AuthAction::ShowAll => "show-all",
        }
    }
}

impl AuthFlags {
    #[must_use]
    pub fn candidates(&self) -> Vec<AuthAction> {
        [
            (self.login || self.with_token, AuthAction::Login),
            (self.logout, AuthAction::Logout),
            (self.show_all, AuthAction::ShowAll),
        ]
        .into_iter()
        .filter_map(|(set, action)| set.then_some(action))
        .collect()
    }
}

#[derive(Debug, Default, Clone, Args)]
pub struct WhoamiFlags {
    /// Print the account as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// # Errors
/// Returns an error if stdin cannot be read, the token is rejected, or the
/// config store cannot be written
pub fn run(ctx: &AppContext, flags: &AuthFlags) -> Result<Outcome> {
    let piped = if flags.with_token {
        let mut token = String::new();
        std::io::stdin()
            .read_to_string(&mut token)
            .context("Failed to read the token from stdin")?;
        Some(token)
    } else {
        None
    };

    run_with(
        &ctx.store,
        &ctx.github()?,
        &RealSelectionProvider,
        flags,
        piped.as_deref(),
    )
}

/// `piped_token` replaces the masked prompt (and the overwrite confirmation)
/// when the token came from stdin
///
/// # Errors
/// Returns an error if the token is rejected or the config store cannot be written
pub fn run_with(
    store: &ConfigStore,
    api: &dyn GithubApi,
    provider: &dyn SelectionProvider,
    flags: &AuthFlags,
    piped_token: Option<&str>,
) -> Result<Outcome> {
    match answer_or_cancel!(resolve(flags.candidates(), provider)) {
        AuthAction::Login => login(store, api, provider, piped_token),
        AuthAction::Logout => logout(store, provider),
        AuthAction::ShowAll => {
            show_all(store)?;
            Ok(Outcome::Completed)
        }
    }
}

fn token_shape(input: &str) -> Result<Validation, Box<dyn Error + Send + Sync>> {
    if is_valid_token_format(input) {
        Ok(Validation::Valid)
    } else {
        Ok(Validation::Invalid(
            "Expected a classic (ghp_...) or fine-grained (github_pat_...) token.".into(),
        ))
    }
}

fn login(
    store: &ConfigStore,
    api: &dyn GithubApi,
    provider: &dyn SelectionProvider,
    piped_token: Option<&str>,
) -> Result<Outcome> {
    if let Some(existing) = store.load_credentials()? {
        println!("Already logged in as {}.", existing.verified_user.login);
        if piped_token.is_none() {
            confirm_or_cancel!(provider, "Replace the stored token?", false);
        }
    }

    let token = match piped_token {
        Some(token) => token.trim().to_string(),
        None => answer_or_cancel!(
            provider.get_secret("GitHub personal access token:", Some(token_shape))
        )
        .trim()
        .to_string(),
    };
    if !is_valid_token_format(&token) {
        anyhow::bail!(
            "That does not look like a GitHub token. Expected a classic (ghp_...) or fine-grained (github_pat_...) token."
        );
    }

    let mut user = api
        .current_user(&token)
        .context("Could not verify the token with GitHub")?;
    if user.email.is_none() {
        match api.primary_email(&token) {
            Ok(email) => user.email = email,
            Err(error) => debug!(%error, "primary email lookup failed"),
        }
    }

    let login = user.login.clone();
    store.save_credentials(&Credential::new(token.clone(), user))?;
    store.env_set(ENV_TOKEN_KEY, &token)?;
    store.env_set(ENV_USER_KEY, &login)?;

    println!("✓ Logged in as {login}");
    Ok(Outcome::Completed)
}

fn logout(store: &ConfigStore, provider: &dyn SelectionProvider) -> Result<Outcome> {
    let Some(existing) = store.load_credentials()? else {
        println!("Not logged in.");
        return Ok(Outcome::Completed);
    };

    let question = format!("Log out {}?", existing.verified_user.login);
    confirm_or_cancel!(provider, &question, true);

    store.delete_credentials()?;
    for key in [ENV_TOKEN_KEY, ENV_USER_KEY] {
        if let Err(error) = store.env_remove(key) {
            warn!(%error, key, "could not clear .env entry");
        }
    }
    println!("✓ Logged out {}", existing.verified_user.login);
    Ok(Outcome::Completed)
}

fn show_all(store: &ConfigStore) -> Result<()> {
    let Some(credential) = store.load_credentials()? else {
        println!("{NOT_LOGGED_IN}");
        return Ok(());
    };

    println!("{}", heading("GitHub account"));
    print!("{}", describe_user(&credential.verified_user));
    println!("Token:     {}", credential.masked_token());
    println!(
        "Saved:     {}",
        credential.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!("Stored in: {}", store.root().display());
    Ok(())
}

fn describe_user(user: &UserSummary) -> String {
    let mut text = format!("User:      {}\n", user.login);
    if let Some(name) = &user.name {
        text.push_str(&format!("Name:      {name}\n"));
    }
    if let Some(email) = &user.email {
        text.push_str(&format!("Email:     {email}\n"));
    }
    text
}

/// Print the cached account; not being logged in is not an error
///
/// # Errors
/// Returns an error if the credential file exists but cannot be read
pub fn whoami(ctx: &AppContext, flags: &WhoamiFlags) -> Result<Outcome> {
    whoami_with(&ctx.store, flags)
}

/// # Errors
/// Returns an error if the credential file exists but cannot be read
pub fn whoami_with(store: &ConfigStore, flags: &WhoamiFlags) -> Result<Outcome> {
    let Some(credential) = store.load_credentials()? else {
        println!("{NOT_LOGGED_IN}");
        return Ok(Outcome::Completed);
    };

    if flags.json {
        println!("{}", serde_json::to_string_pretty(&credential.verified_user)?);
    } else {
        print!("{}", describe_user(&credential.verified_user));
    }
    Ok(Outcome::Completed)
}
