use std::cell::RefCell;
use std::collections::HashMap;

use super::{CreateRepoRequest, GithubError, Owner, Repository, UserSummary};
use crate::traits::GithubApi;

/// In-memory GitHub double for tests
///
/// Only `valid_token` is accepted; anything else gets a 401 like the real API.
/// Repository creation echoes the request back under the stub user and is
/// recorded for inspection.
pub struct StubGithub {
    valid_token: String,
    user: UserSummary,
    primary_email: Option<String>,
    repositories: Vec<Repository>,
    templates: HashMap<String, String>,
    reachable: bool,
    created: RefCell<Vec<CreateRepoRequest>>,
}

impl StubGithub {
    pub fn new(valid_token: &str, login: &str) -> Self {
        Self {
            valid_token: valid_token.to_string(),
            user: UserSummary {
                login: login.to_string(),
                email: None,
                name: None,
                user_view_type: None,
            },
            primary_email: None,
            repositories: Vec::new(),
            templates: HashMap::new(),
            reachable: true,
            created: RefCell::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_primary_email(mut self, email: &str) -> Self {
        self.primary_email = Some(email.to_string());
        self
    }

    #[must_use]
    pub fn with_repository(mut self, repository: Repository) -> Self {
        self.repositories.push(repository);
        self
    }

    #[must_use]
    pub fn with_template(mut self, name: &str, body: &str) -> Self {
        self.templates.insert(name.to_string(), body.to_string());
        self
    }

    #[must_use]
    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    /// Every repository creation request received so far
    pub fn created(&self) -> Vec<CreateRepoRequest> {
        self.created.borrow().clone()
    }

    /// Repository record as GitHub would return it for `owner/name`
    pub fn repository_record(owner: &str, name: &str) -> Repository {
        Repository {
            id: 1_296_269,
            name: name.to_string(),
            full_name: format!("{owner}/{name}"),
            description: None,
            private: false,
            html_url: format!("https://github.com/{owner}/{name}"),
            clone_url: format!("https://github.com/{owner}/{name}.git"),
            default_branch: Some("main".to_string()),
            owner: Owner {
                login: owner.to_string(),
                id: 1,
                html_url: format!("https://github.com/{owner}"),
                kind: "User".to_string(),
                user_view_type: Some("public".to_string()),
            },
        }
    }

    fn authorize(&self, token: &str) -> Result<(), GithubError> {
        if token == self.valid_token {
            Ok(())
        } else {
            Err(GithubError::Api {
                status: 401,
                message: "Bad credentials".to_string(),
            })
        }
    }
}

impl GithubApi for StubGithub {
    fn current_user(&self, token: &str) -> Result<UserSummary, GithubError> {
        self.authorize(token)?;
        Ok(self.user.clone())
    }

    fn primary_email(&self, token: &str) -> Result<Option<String>, GithubError> {
        self.authorize(token)?;
        Ok(self.primary_email.clone())
    }

    fn create_repository(
        &self,
        token: &str,
        request: &CreateRepoRequest,
    ) -> Result<Repository, GithubError> {
        self.authorize(token)?;
        self.created.borrow_mut().push(request.clone());

        let mut repository = Self::repository_record(&self.user.login, &request.name);
        repository.description.clone_from(&request.description);
        repository.private = request.private;
        Ok(repository)
    }

    fn repository(
        &self,
        token: Option<&str>,
        owner: &str,
        name: &str,
    ) -> Result<Repository, GithubError> {
        if let Some(token) = token {
            self.authorize(token)?;
        }
        self.repositories
            .iter()
            .find(|repo| repo.owner.login == owner && repo.name == name)
            .cloned()
            .ok_or_else(|| GithubError::Api {
                status: 404,
                message: "Not Found".to_string(),
            })
    }

    fn gitignore_template(&self, name: &str) -> Result<String, GithubError> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| GithubError::TemplateNotFound(name.to_string()))
    }

    fn is_reachable(&self) -> bool {
        self.reachable
    }
}
