//! Postgres persistence for payment receipts.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use tutorlink_common::{map_db_error, DomainError};

use crate::model::PaymentReceipt;

#[async_trait]
pub trait ReceiptRepository: Send + Sync {
    /// The unique key on lesson id makes a second receipt for the same
    /// lesson an `AlreadyExists`.
    async fn create(&self, receipt: &PaymentReceipt) -> Result<(), DomainError>;
    async fn get(&self, id: Uuid) -> Result<PaymentReceipt, DomainError>;
    async fn set_verified(&self, id: Uuid, verified: bool) -> Result<PaymentReceipt, DomainError>;
}

pub struct PostgresReceiptRepository {
    pool: PgPool,
}

impl PostgresReceiptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn receipt_from_row(row: PgRow) -> Result<PaymentReceipt, DomainError> {
    Ok(PaymentReceipt {
        id: row.try_get("id").map_err(map_db_error)?,
        lesson_id: row.try_get("lesson_id").map_err(map_db_error)?,
        file_id: row.try_get("file_id").map_err(map_db_error)?,
        is_verified: row.try_get("is_verified").map_err(map_db_error)?,
        created_at: row.try_get("created_at").map_err(map_db_error)?,
        edited_at: row.try_get("edited_at").map_err(map_db_error)?,
    })
}

#[async_trait]
impl ReceiptRepository for PostgresReceiptRepository {
    async fn create(&self, receipt: &PaymentReceipt) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO payment_receipts (id, lesson_id, file_id, is_verified, created_at, edited_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(receipt.id)
        .bind(receipt.lesson_id)
        .bind(receipt.file_id)
        .bind(receipt.is_verified)
        .bind(receipt.created_at)
        .bind(receipt.edited_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<PaymentReceipt, DomainError> {
        let row = sqlx::query(
            "SELECT id, lesson_id, file_id, is_verified, created_at, edited_at
             FROM payment_receipts WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match map_db_error(e) {
            DomainError::NotFound(_) => DomainError::NotFound("receipt not found".to_string()),
            other => other,
        })?;
        receipt_from_row(row)
    }

    async fn set_verified(&self, id: Uuid, verified: bool) -> Result<PaymentReceipt, DomainError> {
        let row = sqlx::query(
            "UPDATE payment_receipts SET is_verified = $2, edited_at = NOW()
             WHERE id = $1
             RETURNING id, lesson_id, file_id, is_verified, created_at, edited_at",
        )
        .bind(id)
        .bind(verified)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match map_db_error(e) {
            DomainError::NotFound(_) => DomainError::NotFound("receipt not found".to_string()),
            other => other,
        })?;
        receipt_from_row(row)
    }
}
