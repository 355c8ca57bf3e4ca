use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{CompaniesRepo, CreateCompanyParams, RepoError};
use crate::domain::entities::CompanyRecord;
use crate::domain::identifier::NormalizedId;

#[derive(Debug, Error)]
pub enum CompanyError {
    #[error("{0}")]
    ConstraintViolation(&'static str),
    #[error("company already exists")]
    Duplicate,
    #[error("company not found")]
    NotFound,
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for CompanyError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Duplicate { .. } => Self::Duplicate,
            other => Self::Repo(other),
        }
    }
}

#[derive(Clone)]
pub struct CompanyService {
    companies: Arc<dyn CompaniesRepo>,
}

impl CompanyService {
    pub fn new(companies: Arc<dyn CompaniesRepo>) -> Self {
        Self { companies }
    }

    /// Register a company. The slug is the normalized form of `slug`, or of
    /// `name` when no slug is given.
    pub async fn create(
        &self,
        name: &str,
        slug: Option<&str>,
    ) -> Result<CompanyRecord, CompanyError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CompanyError::ConstraintViolation("name"));
        }
        let slug = NormalizedId::parse(slug.unwrap_or(name))
            .map_err(|_| CompanyError::ConstraintViolation("slug"))?;
        if slug.as_str().contains(':') {
            return Err(CompanyError::ConstraintViolation("slug"));
        }

        let company = self
            .companies
            .create_company(CreateCompanyParams {
                slug: slug.into_string(),
                name: name.to_string(),
            })
            .await?;

        info!(target = "roombook::companies", company = %company.slug, "company created");
        Ok(company)
    }

    pub async fn get(&self, company: &str) -> Result<CompanyRecord, CompanyError> {
        let slug = NormalizedId::parse(company)
            .map_err(|_| CompanyError::ConstraintViolation("companyId"))?;
        self.companies
            .find_company(slug.as_str())
            .await?
            .ok_or(CompanyError::NotFound)
    }
}
