use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{CompaniesRepo, CreateCompanyParams, RepoError},
    domain::entities::CompanyRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CompanyRow {
    id: Uuid,
    slug: String,
    name: String,
    created_at: OffsetDateTime,
}

impl From<CompanyRow> for CompanyRecord {
    fn from(row: CompanyRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CompaniesRepo for PostgresRepositories {
    async fn create_company(
        &self,
        params: CreateCompanyParams,
    ) -> Result<CompanyRecord, RepoError> {
        let row = sqlx::query_as::<_, CompanyRow>(
            r#"
            INSERT INTO companies (id, slug, name)
            VALUES ($1, $2, $3)
            RETURNING id, slug, name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&params.slug)
        .bind(&params.name)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_company(&self, slug: &str) -> Result<Option<CompanyRecord>, RepoError> {
        let row = sqlx::query_as::<_, CompanyRow>(
            r#"
            SELECT id, slug, name, created_at
            FROM companies
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(CompanyRecord::from))
    }
}
