//! Postgres persistence for users, telegram accounts, tutor profiles and
//! tutor-student relationships.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use tutorlink_common::{map_db_error, DomainError};

use crate::model::*;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Sign-up writes the user, the telegram binding and (for tutors) the
    /// profile in one transaction.
    async fn create_user_bundle(
        &self,
        user: &User,
        account: &TelegramAccount,
        profile: Option<&TutorProfile>,
    ) -> Result<(), DomainError>;

    async fn get_user(&self, id: Uuid) -> Result<User, DomainError>;
    async fn update_user(&self, id: Uuid, input: &UpdateUserInput) -> Result<User, DomainError>;

    async fn get_tutor_profile(&self, user_id: Uuid) -> Result<TutorProfile, DomainError>;
    async fn update_tutor_profile(
        &self,
        user_id: Uuid,
        input: &UpdateTutorProfileInput,
    ) -> Result<TutorProfile, DomainError>;

    async fn get_telegram_account_by_telegram_id(
        &self,
        telegram_id: i64,
    ) -> Result<TelegramAccount, DomainError>;
}

#[async_trait]
pub trait TutorStudentRepository: Send + Sync {
    async fn create(&self, ts: &TutorStudent) -> Result<(), DomainError>;
    async fn get(&self, tutor_id: Uuid, student_id: Uuid) -> Result<TutorStudent, DomainError>;
    async fn update(
        &self,
        tutor_id: Uuid,
        student_id: Uuid,
        input: &UpdateTutorStudentInput,
    ) -> Result<TutorStudent, DomainError>;
    async fn delete(&self, tutor_id: Uuid, student_id: Uuid) -> Result<(), DomainError>;
    async fn list_by_tutor(&self, tutor_id: Uuid) -> Result<Vec<TutorStudent>, DomainError>;
    async fn list_by_student(&self, student_id: Uuid) -> Result<Vec<TutorStudent>, DomainError>;
}

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: PgRow) -> Result<User, DomainError> {
    let role: String = row.try_get("role").map_err(map_db_error)?;
    let status: String = row.try_get("status").map_err(map_db_error)?;
    Ok(User {
        id: row.try_get("id").map_err(map_db_error)?,
        role: Role::parse(&role)
            .ok_or_else(|| DomainError::internal(format!("unknown role in store: {role}")))?,
        auth_provider: row.try_get("auth_provider").map_err(map_db_error)?,
        status: UserStatus::parse(&status)
            .ok_or_else(|| DomainError::internal(format!("unknown status in store: {status}")))?,
        first_name: row.try_get("first_name").map_err(map_db_error)?,
        last_name: row.try_get("last_name").map_err(map_db_error)?,
        timezone: row.try_get("timezone").map_err(map_db_error)?,
        created_at: row.try_get("created_at").map_err(map_db_error)?,
        edited_at: row.try_get("edited_at").map_err(map_db_error)?,
    })
}

fn profile_from_row(row: PgRow) -> Result<TutorProfile, DomainError> {
    Ok(TutorProfile {
        id: row.try_get("id").map_err(map_db_error)?,
        user_id: row.try_get("user_id").map_err(map_db_error)?,
        payment_info: row.try_get("payment_info").map_err(map_db_error)?,
        lesson_price_rub: row.try_get("lesson_price_rub").map_err(map_db_error)?,
        lesson_connection_link: row
            .try_get("lesson_connection_link")
            .map_err(map_db_error)?,
        created_at: row.try_get("created_at").map_err(map_db_error)?,
        edited_at: row.try_get("edited_at").map_err(map_db_error)?,
    })
}

fn tutor_student_from_row(row: PgRow) -> Result<TutorStudent, DomainError> {
    let status: String = row.try_get("status").map_err(map_db_error)?;
    Ok(TutorStudent {
        id: row.try_get("id").map_err(map_db_error)?,
        tutor_id: row.try_get("tutor_id").map_err(map_db_error)?,
        student_id: row.try_get("student_id").map_err(map_db_error)?,
        status: TutorStudentStatus::parse(&status)
            .ok_or_else(|| DomainError::internal(format!("unknown status in store: {status}")))?,
        lesson_price_rub: row.try_get("lesson_price_rub").map_err(map_db_error)?,
        lesson_connection_link: row
            .try_get("lesson_connection_link")
            .map_err(map_db_error)?,
        created_at: row.try_get("created_at").map_err(map_db_error)?,
        edited_at: row.try_get("edited_at").map_err(map_db_error)?,
    })
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create_user_bundle(
        &self,
        user: &User,
        account: &TelegramAccount,
        profile: Option<&TutorProfile>,
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query(
            "INSERT INTO users (id, role, auth_provider, status, first_name, last_name, timezone, created_at, edited_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(user.id)
        .bind(user.role.as_str())
        .bind(&user.auth_provider)
        .bind(user.status.as_str())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.timezone)
        .bind(user.created_at)
        .bind(user.edited_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        sqlx::query(
            "INSERT INTO telegram_accounts (id, user_id, telegram_id, username, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(account.id)
        .bind(account.user_id)
        .bind(account.telegram_id)
        .bind(&account.username)
        .bind(account.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if let Some(profile) = profile {
            sqlx::query(
                "INSERT INTO tutor_profiles (id, user_id, payment_info, lesson_price_rub, lesson_connection_link, created_at, edited_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(profile.id)
            .bind(profile.user_id)
            .bind(&profile.payment_info)
            .bind(profile.lesson_price_rub)
            .bind(&profile.lesson_connection_link)
            .bind(profile.created_at)
            .bind(profile.edited_at)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)
    }

    async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        let row = sqlx::query(
            "SELECT id, role, auth_provider, status, first_name, last_name, timezone, created_at, edited_at
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        user_from_row(row)
    }

    async fn update_user(&self, id: Uuid, input: &UpdateUserInput) -> Result<User, DomainError> {
        let row = sqlx::query(
            "UPDATE users
             SET first_name = COALESCE($2, first_name),
                 last_name = COALESCE($3, last_name),
                 timezone = COALESCE($4, timezone),
                 edited_at = NOW()
             WHERE id = $1
             RETURNING id, role, auth_provider, status, first_name, last_name, timezone, created_at, edited_at",
        )
        .bind(id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.timezone)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        user_from_row(row)
    }

    async fn get_tutor_profile(&self, user_id: Uuid) -> Result<TutorProfile, DomainError> {
        let row = sqlx::query(
            "SELECT id, user_id, payment_info, lesson_price_rub, lesson_connection_link, created_at, edited_at
             FROM tutor_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        profile_from_row(row)
    }

    async fn update_tutor_profile(
        &self,
        user_id: Uuid,
        input: &UpdateTutorProfileInput,
    ) -> Result<TutorProfile, DomainError> {
        let row = sqlx::query(
            "UPDATE tutor_profiles
             SET payment_info = COALESCE($2, payment_info),
                 lesson_price_rub = COALESCE($3, lesson_price_rub),
                 lesson_connection_link = COALESCE($4, lesson_connection_link),
                 edited_at = NOW()
             WHERE user_id = $1
             RETURNING id, user_id, payment_info, lesson_price_rub, lesson_connection_link, created_at, edited_at",
        )
        .bind(user_id)
        .bind(&input.payment_info)
        .bind(input.lesson_price_rub)
        .bind(&input.lesson_connection_link)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        profile_from_row(row)
    }

    async fn get_telegram_account_by_telegram_id(
        &self,
        telegram_id: i64,
    ) -> Result<TelegramAccount, DomainError> {
        let row = sqlx::query(
            "SELECT id, user_id, telegram_id, username, created_at
             FROM telegram_accounts WHERE telegram_id = $1",
        )
        .bind(telegram_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(TelegramAccount {
            id: row.try_get("id").map_err(map_db_error)?,
            user_id: row.try_get("user_id").map_err(map_db_error)?,
            telegram_id: row.try_get("telegram_id").map_err(map_db_error)?,
            username: row.try_get("username").map_err(map_db_error)?,
            created_at: row.try_get("created_at").map_err(map_db_error)?,
        })
    }
}

pub struct PostgresTutorStudentRepository {
    pool: PgPool,
}

impl PostgresTutorStudentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const TS_COLUMNS: &str =
    "id, tutor_id, student_id, status, lesson_price_rub, lesson_connection_link, created_at, edited_at";

#[async_trait]
impl TutorStudentRepository for PostgresTutorStudentRepository {
    async fn create(&self, ts: &TutorStudent) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO tutor_students (id, tutor_id, student_id, status, lesson_price_rub, lesson_connection_link, created_at, edited_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(ts.id)
        .bind(ts.tutor_id)
        .bind(ts.student_id)
        .bind(ts.status.as_str())
        .bind(ts.lesson_price_rub)
        .bind(&ts.lesson_connection_link)
        .bind(ts.created_at)
        .bind(ts.edited_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    async fn get(&self, tutor_id: Uuid, student_id: Uuid) -> Result<TutorStudent, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {TS_COLUMNS} FROM tutor_students WHERE tutor_id = $1 AND student_id = $2"
        ))
        .bind(tutor_id)
        .bind(student_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        tutor_student_from_row(row)
    }

    async fn update(
        &self,
        tutor_id: Uuid,
        student_id: Uuid,
        input: &UpdateTutorStudentInput,
    ) -> Result<TutorStudent, DomainError> {
        let row = sqlx::query(&format!(
            "UPDATE tutor_students
             SET lesson_price_rub = COALESCE($3, lesson_price_rub),
                 lesson_connection_link = COALESCE($4, lesson_connection_link),
                 status = COALESCE($5, status),
                 edited_at = NOW()
             WHERE tutor_id = $1 AND student_id = $2
             RETURNING {TS_COLUMNS}"
        ))
        .bind(tutor_id)
        .bind(student_id)
        .bind(input.lesson_price_rub)
        .bind(&input.lesson_connection_link)
        .bind(input.status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        tutor_student_from_row(row)
    }

    async fn delete(&self, tutor_id: Uuid, student_id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM tutor_students WHERE tutor_id = $1 AND student_id = $2")
            .bind(tutor_id)
            .bind(student_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("tutor-student not found".to_string()));
        }
        Ok(())
    }

    async fn list_by_tutor(&self, tutor_id: Uuid) -> Result<Vec<TutorStudent>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {TS_COLUMNS} FROM tutor_students WHERE tutor_id = $1 ORDER BY created_at ASC"
        ))
        .bind(tutor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;
        rows.into_iter().map(tutor_student_from_row).collect()
    }

    async fn list_by_student(&self, student_id: Uuid) -> Result<Vec<TutorStudent>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {TS_COLUMNS} FROM tutor_students WHERE student_id = $1 ORDER BY created_at ASC"
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;
        rows.into_iter().map(tutor_student_from_row).collect()
    }
}
