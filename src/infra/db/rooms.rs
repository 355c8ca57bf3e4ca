use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{CreateRoomParams, DeletedRoom, RepoError, RoomsRepo},
    domain::entities::RoomRecord,
};

use super::{PostgresRepositories, map_sqlx_error, reservations::ReservationRow};

#[derive(sqlx::FromRow)]
struct RoomRow {
    id: Uuid,
    company_slug: String,
    name: String,
    capacity: i32,
    restricted_to: Vec<Uuid>,
    created_at: OffsetDateTime,
}

impl From<RoomRow> for RoomRecord {
    fn from(row: RoomRow) -> Self {
        Self {
            id: row.id,
            company_slug: row.company_slug,
            name: row.name,
            capacity: row.capacity,
            restricted_to: row.restricted_to,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl RoomsRepo for PostgresRepositories {
    async fn list_rooms_for_company(
        &self,
        company_slug: &str,
    ) -> Result<Vec<RoomRecord>, RepoError> {
        let rows = sqlx::query_as::<_, RoomRow>(
            r#"
            SELECT id, company_slug, name, capacity, restricted_to, created_at
            FROM rooms
            WHERE company_slug = $1
            ORDER BY LOWER(name), id
            "#,
        )
        .bind(company_slug)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(RoomRecord::from).collect())
    }

    async fn find_room(&self, id: Uuid) -> Result<Option<RoomRecord>, RepoError> {
        let row = sqlx::query_as::<_, RoomRow>(
            r#"
            SELECT id, company_slug, name, capacity, restricted_to, created_at
            FROM rooms
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(RoomRecord::from))
    }

    async fn create_room(&self, params: CreateRoomParams) -> Result<RoomRecord, RepoError> {
        let row = sqlx::query_as::<_, RoomRow>(
            r#"
            INSERT INTO rooms (id, company_slug, name, capacity, restricted_to)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, company_slug, name, capacity, restricted_to, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&params.company_slug)
        .bind(&params.name)
        .bind(params.capacity)
        .bind(&params.restricted_to)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete_room(&self, id: Uuid) -> Result<Option<DeletedRoom>, RepoError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let reservations = sqlx::query_as::<_, ReservationRow>(
            r#"
            DELETE FROM reservations
            WHERE room_id = $1
            RETURNING id, company_slug, room_id, user_id, title, starts_at, ends_at, created_at
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let room = sqlx::query_as::<_, RoomRow>(
            r#"
            DELETE FROM rooms
            WHERE id = $1
            RETURNING id, company_slug, name, capacity, restricted_to, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let Some(room) = room else {
            tx.rollback().await.map_err(map_sqlx_error)?;
            return Ok(None);
        };

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(Some(DeletedRoom {
            room: room.into(),
            reservations: reservations.into_iter().map(Into::into).collect(),
        }))
    }
}
