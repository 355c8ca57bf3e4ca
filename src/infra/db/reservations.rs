use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{CreateReservationParams, RepoError, ReservationsRepo},
    domain::entities::ReservationRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
pub(super) struct ReservationRow {
    id: Uuid,
    company_slug: String,
    room_id: Uuid,
    user_id: Uuid,
    title: String,
    starts_at: OffsetDateTime,
    ends_at: OffsetDateTime,
    created_at: OffsetDateTime,
}

impl From<ReservationRow> for ReservationRecord {
    fn from(row: ReservationRow) -> Self {
        Self {
            id: row.id,
            company_slug: row.company_slug,
            room_id: row.room_id,
            user_id: row.user_id,
            title: row.title,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ReservationsRepo for PostgresRepositories {
    async fn list_reservations_for_company(
        &self,
        company_slug: &str,
    ) -> Result<Vec<ReservationRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ReservationRow>(
            r#"
            SELECT id, company_slug, room_id, user_id, title, starts_at, ends_at, created_at
            FROM reservations
            WHERE company_slug = $1
            ORDER BY starts_at, id
            "#,
        )
        .bind(company_slug)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ReservationRecord::from).collect())
    }

    async fn list_reservations_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ReservationRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ReservationRow>(
            r#"
            SELECT id, company_slug, room_id, user_id, title, starts_at, ends_at, created_at
            FROM reservations
            WHERE user_id = $1
            ORDER BY starts_at, id
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ReservationRecord::from).collect())
    }

    async fn list_overlapping(
        &self,
        room_id: Uuid,
        starts_at: OffsetDateTime,
        ends_at: OffsetDateTime,
    ) -> Result<Vec<ReservationRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ReservationRow>(
            r#"
            SELECT id, company_slug, room_id, user_id, title, starts_at, ends_at, created_at
            FROM reservations
            WHERE room_id = $1
              AND starts_at < $3
              AND ends_at > $2
            ORDER BY starts_at
            "#,
        )
        .bind(room_id)
        .bind(starts_at)
        .bind(ends_at)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ReservationRecord::from).collect())
    }

    async fn create_reservation(
        &self,
        params: CreateReservationParams,
    ) -> Result<ReservationRecord, RepoError> {
        let row = sqlx::query_as::<_, ReservationRow>(
            r#"
            INSERT INTO reservations (id, company_slug, room_id, user_id, title, starts_at, ends_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, company_slug, room_id, user_id, title, starts_at, ends_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&params.company_slug)
        .bind(params.room_id)
        .bind(params.user_id)
        .bind(&params.title)
        .bind(params.starts_at)
        .bind(params.ends_at)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete_reservation(&self, id: Uuid) -> Result<Option<ReservationRecord>, RepoError> {
        let row = sqlx::query_as::<_, ReservationRow>(
            r#"
            DELETE FROM reservations
            WHERE id = $1
            RETURNING id, company_slug, room_id, user_id, title, starts_at, ends_at, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(ReservationRecord::from))
    }
}
