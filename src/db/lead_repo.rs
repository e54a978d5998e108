// src/db/lead_repo.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::Pagination},
    db::LeadStore,
    models::{
        dashboard::LeadStats,
        lead::{Lead, LeadComment, LeadFilter, LeadOrigin, LeadSegment, LeadStatus},
    },
};

// Filtros opcionais: parâmetro NULL desliga a condição
const LEAD_FILTER_WHERE: &str = r#"
    WHERE ($1::lead_status IS NULL OR status = $1)
      AND ($2::text IS NULL OR city ILIKE '%' || $2 || '%')
      AND ($3::text IS NULL OR state = $3)
      AND ($4::lead_origin IS NULL OR origin = $4)
      AND ($5::lead_segment IS NULL OR segment = $5)
      AND ($6::boolean IS NULL OR is_prioritario = $6)
      AND ($7::uuid IS NULL OR assigned_to = $7)
      AND ($8::text IS NULL
           OR name ILIKE '%' || $8 || '%'
           OR email ILIKE '%' || $8 || '%'
           OR cpf ILIKE '%' || $8 || '%')
"#;

// O repositório de leads, responsável pelas tabelas 'leads' e 'lead_comments'
#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Converte violação de chave única (email/cpf) em um erro mais amigável
fn map_unique_violation(e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some(c) if c.contains("cpf") => AppError::CpfAlreadyExists,
                _ => AppError::EmailAlreadyExists,
            };
        }
    }
    AppError::DatabaseError(e)
}

// COUNT(*) vem como BIGINT
fn counts<K>(rows: Vec<(K, i64)>) -> Vec<(K, usize)> {
    rows.into_iter().map(|(key, count)| (key, count as usize)).collect()
}

#[async_trait]
impl LeadStore for LeadRepository {
    async fn insert(&self, lead: &Lead) -> Result<Lead, AppError> {
        sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (
                id, name, email, cpf, phone, city, state,
                status, origin, assigned_to,
                segment, priority_score, is_prioritario, total_area_hectares, main_crops,
                notes, created_at, updated_at, last_contact_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING *
            "#,
        )
        .bind(lead.id)
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.cpf)
        .bind(&lead.phone)
        .bind(&lead.city)
        .bind(&lead.state)
        .bind(lead.status)
        .bind(lead.origin)
        .bind(lead.assigned_to)
        .bind(lead.segment)
        .bind(lead.priority_score)
        .bind(lead.is_prioritario)
        .bind(lead.total_area_hectares)
        .bind(&lead.main_crops)
        .bind(&lead.notes)
        .bind(lead.created_at)
        .bind(lead.updated_at)
        .bind(lead.last_contact_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lead>, AppError> {
        let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(lead)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Lead>, AppError> {
        let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(lead)
    }

    async fn find_by_cpf(&self, cpf: &str) -> Result<Option<Lead>, AppError> {
        let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE cpf = $1")
            .bind(cpf)
            .fetch_optional(&self.pool)
            .await?;
        Ok(lead)
    }

    async fn update(&self, lead: &Lead) -> Result<Lead, AppError> {
        sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads SET
                name = $2, email = $3, cpf = $4, phone = $5, city = $6, state = $7,
                status = $8, origin = $9, assigned_to = $10,
                segment = $11, priority_score = $12, is_prioritario = $13,
                total_area_hectares = $14, main_crops = $15,
                notes = $16, updated_at = $17, last_contact_at = $18
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(lead.id)
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.cpf)
        .bind(&lead.phone)
        .bind(&lead.city)
        .bind(&lead.state)
        .bind(lead.status)
        .bind(lead.origin)
        .bind(lead.assigned_to)
        .bind(lead.segment)
        .bind(lead.priority_score)
        .bind(lead.is_prioritario)
        .bind(lead.total_area_hectares)
        .bind(&lead.main_crops)
        .bind(&lead.notes)
        .bind(lead.updated_at)
        .bind(lead.last_contact_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique_violation)?
        .ok_or(AppError::LeadNotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::LeadNotFound);
        }
        Ok(())
    }

    async fn stats(&self) -> Result<LeadStats, AppError> {
        // Snapshot consistente entre as consultas
        let mut tx = self.pool.begin().await?;

        // A. Totais
        let (total_leads, prioritarios, total_area_hectares, priority_score_sum) =
            sqlx::query_as::<_, (i64, i64, Option<Decimal>, i64)>(
                r#"
                SELECT COUNT(*),
                       COUNT(*) FILTER (WHERE is_prioritario),
                       SUM(total_area_hectares),
                       COALESCE(SUM(priority_score), 0)::BIGINT
                FROM leads
                "#,
            )
            .fetch_one(&mut *tx)
            .await?;

        // B. Distribuições
        let by_status = sqlx::query_as::<_, (LeadStatus, i64)>("SELECT status, COUNT(*) FROM leads GROUP BY status")
            .fetch_all(&mut *tx)
            .await?;

        let by_city = sqlx::query_as::<_, (String, i64)>(
            "SELECT city, COUNT(*) FROM leads WHERE city IS NOT NULL AND city <> '' GROUP BY city",
        )
        .fetch_all(&mut *tx)
        .await?;

        let by_state = sqlx::query_as::<_, (String, i64)>("SELECT state, COUNT(*) FROM leads GROUP BY state")
            .fetch_all(&mut *tx)
            .await?;

        let by_origin = sqlx::query_as::<_, (LeadOrigin, i64)>(
            "SELECT origin, COUNT(*) FROM leads WHERE origin IS NOT NULL GROUP BY origin",
        )
        .fetch_all(&mut *tx)
        .await?;

        let by_segment = sqlx::query_as::<_, (LeadSegment, i64)>(
            "SELECT segment, COUNT(*) FROM leads WHERE segment IS NOT NULL GROUP BY segment",
        )
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(LeadStats {
            total_leads: total_leads as usize,
            prioritarios: prioritarios as usize,
            total_area_hectares,
            priority_score_sum,
            by_status: counts(by_status).into_iter().collect(),
            by_city: counts(by_city),
            by_state: counts(by_state),
            by_origin: counts(by_origin),
            by_segment: counts(by_segment),
        })
    }

    async fn list_filtered(&self, filter: &LeadFilter, page: &Pagination) -> Result<(Vec<Lead>, u64), AppError> {
        let select = format!(
            "SELECT * FROM leads {LEAD_FILTER_WHERE} ORDER BY priority_score DESC, created_at DESC LIMIT $9 OFFSET $10"
        );
        let count = format!("SELECT COUNT(*) FROM leads {LEAD_FILTER_WHERE}");

        let leads = sqlx::query_as::<_, Lead>(&select)
            .bind(filter.status)
            .bind(&filter.city)
            .bind(&filter.state)
            .bind(filter.origin)
            .bind(filter.segment)
            .bind(filter.is_prioritario)
            .bind(filter.assigned_to)
            .bind(&filter.search)
            .bind(i64::from(page.limit()))
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(&count)
            .bind(filter.status)
            .bind(&filter.city)
            .bind(&filter.state)
            .bind(filter.origin)
            .bind(filter.segment)
            .bind(filter.is_prioritario)
            .bind(filter.assigned_to)
            .bind(&filter.search)
            .fetch_one(&self.pool)
            .await?;

        Ok((leads, total.max(0) as u64))
    }

    async fn list_priority(&self, page: &Pagination) -> Result<(Vec<Lead>, u64), AppError> {
        let leads = sqlx::query_as::<_, Lead>(
            r#"
            SELECT * FROM leads
            WHERE is_prioritario = TRUE
            ORDER BY priority_score DESC, total_area_hectares DESC NULLS LAST
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(i64::from(page.limit()))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leads WHERE is_prioritario = TRUE")
            .fetch_one(&self.pool)
            .await?;

        Ok((leads, total.max(0) as u64))
    }

    async fn insert_comment(&self, comment: &LeadComment) -> Result<LeadComment, AppError> {
        let comment = sqlx::query_as::<_, LeadComment>(
            r#"
            INSERT INTO lead_comments (id, lead_id, message, author, lead_status_at_time, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(comment.id)
        .bind(comment.lead_id)
        .bind(&comment.message)
        .bind(&comment.author)
        .bind(comment.lead_status_at_time)
        .bind(comment.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn list_comments(&self, lead_id: Uuid, page: &Pagination) -> Result<(Vec<LeadComment>, u64), AppError> {
        let comments = sqlx::query_as::<_, LeadComment>(
            r#"
            SELECT * FROM lead_comments
            WHERE lead_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(lead_id)
        .bind(i64::from(page.limit()))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lead_comments WHERE lead_id = $1")
            .bind(lead_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((comments, total.max(0) as u64))
    }
}
