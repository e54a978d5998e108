// src/db/property_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::Pagination},
    db::PropertyStore,
    models::property::{Property, PropertyFilter},
};

const PROPERTY_FILTER_WHERE: &str = r#"
    WHERE ($1::uuid IS NULL OR lead_id = $1)
      AND ($2::crop_type IS NULL OR crop = $2)
      AND ($3::text IS NULL OR city = $3)
      AND ($4::text IS NULL OR state = $4)
"#;

#[derive(Clone)]
pub struct PropertyRepository {
    pool: PgPool,
}

impl PropertyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PropertyStore for PropertyRepository {
    async fn insert(&self, property: &Property) -> Result<Property, AppError> {
        let property = sqlx::query_as::<_, Property>(
            r#"
            INSERT INTO properties (
                id, lead_id, crop, area_hectares, city, state, geometry, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(property.id)
        .bind(property.lead_id)
        .bind(property.crop)
        .bind(property.area_hectares)
        .bind(&property.city)
        .bind(&property.state)
        .bind(&property.geometry)
        .bind(property.created_at)
        .bind(property.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // FK violada: o lead sumiu entre a checagem e o INSERT
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_foreign_key_violation() {
                    return AppError::LeadNotFound;
                }
            }
            AppError::DatabaseError(e)
        })?;
        Ok(property)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Property>, AppError> {
        let property = sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(property)
    }

    async fn update(&self, property: &Property) -> Result<Property, AppError> {
        sqlx::query_as::<_, Property>(
            r#"
            UPDATE properties SET
                crop = $2, area_hectares = $3, city = $4, state = $5, geometry = $6, updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(property.id)
        .bind(property.crop)
        .bind(property.area_hectares)
        .bind(&property.city)
        .bind(&property.state)
        .bind(&property.geometry)
        .bind(property.updated_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::PropertyNotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM properties WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::PropertyNotFound);
        }
        Ok(())
    }

    async fn list_by_lead(&self, lead_id: Uuid) -> Result<Vec<Property>, AppError> {
        let properties = sqlx::query_as::<_, Property>(
            "SELECT * FROM properties WHERE lead_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(properties)
    }

    async fn list_all(&self) -> Result<Vec<Property>, AppError> {
        let properties = sqlx::query_as::<_, Property>("SELECT * FROM properties ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(properties)
    }

    async fn list_filtered(&self, filter: &PropertyFilter, page: &Pagination) -> Result<(Vec<Property>, u64), AppError> {
        let select = format!(
            "SELECT * FROM properties {PROPERTY_FILTER_WHERE} ORDER BY created_at DESC LIMIT $5 OFFSET $6"
        );
        let count = format!("SELECT COUNT(*) FROM properties {PROPERTY_FILTER_WHERE}");

        let properties = sqlx::query_as::<_, Property>(&select)
            .bind(filter.lead_id)
            .bind(filter.crop)
            .bind(&filter.city)
            .bind(&filter.state)
            .bind(i64::from(page.limit()))
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(&count)
            .bind(filter.lead_id)
            .bind(filter.crop)
            .bind(&filter.city)
            .bind(&filter.state)
            .fetch_one(&self.pool)
            .await?;

        Ok((properties, total.max(0) as u64))
    }
}
