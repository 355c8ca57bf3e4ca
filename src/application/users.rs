use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{CompaniesRepo, CreateUserParams, RepoError, UsersRepo};
use crate::domain::entities::UserRecord;
use crate::domain::identifier::NormalizedId;
use crate::domain::types::UserRole;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("{0}")]
    ConstraintViolation(&'static str),
    #[error("company not found")]
    UnknownCompany,
    #[error("user already exists")]
    Duplicate,
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for UserError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Duplicate { .. } => Self::Duplicate,
            other => Self::Repo(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateUserCommand {
    pub company: String,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UsersRepo>,
    companies: Arc<dyn CompaniesRepo>,
}

impl UserService {
    pub fn new(users: Arc<dyn UsersRepo>, companies: Arc<dyn CompaniesRepo>) -> Self {
        Self { users, companies }
    }

    pub async fn create(&self, command: CreateUserCommand) -> Result<UserRecord, UserError> {
        let company = NormalizedId::parse(&command.company)
            .map_err(|_| UserError::ConstraintViolation("companyId"))?;
        let email = command.email.trim().to_ascii_lowercase();
        if !is_plausible_email(&email) {
            return Err(UserError::ConstraintViolation("email"));
        }
        let display_name = command.display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(UserError::ConstraintViolation("displayName"));
        }

        if self.companies.find_company(company.as_str()).await?.is_none() {
            return Err(UserError::UnknownCompany);
        }

        let user = self
            .users
            .create_user(CreateUserParams {
                company_slug: company.into_string(),
                email,
                display_name,
                role: command.role,
            })
            .await?;

        info!(
            target = "roombook::users",
            user_id = %user.id,
            company = %user.company_slug,
            role = user.role.as_str(),
            "user created"
        );
        Ok(user)
    }

    pub async fn list_for_company(&self, company: &str) -> Result<Vec<UserRecord>, UserError> {
        let company = NormalizedId::parse(company)
            .map_err(|_| UserError::ConstraintViolation("companyId"))?;
        Ok(self.users.list_users_for_company(company.as_str()).await?)
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
