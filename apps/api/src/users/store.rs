use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::User;

pub struct NewUser<'a> {
    pub email: &'a str,
    pub full_name: &'a str,
    pub phone: Option<&'a str>,
    pub role: &'a str,
}

pub async fn insert_user(pool: &PgPool, new: NewUser<'_>) -> sqlx::Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, full_name, phone, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.email)
    .bind(new.full_name)
    .bind(new.phone)
    .bind(new.role)
    .fetch_one(pool)
    .await
}

pub async fn find_user(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// `None` arguments leave the column unchanged.
pub async fn update_user(
    pool: &PgPool,
    id: Uuid,
    full_name: Option<&str>,
    phone: Option<&str>,
) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET full_name  = COALESCE($2, full_name),
            phone      = COALESCE($3, phone),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(full_name)
    .bind(phone)
    .fetch_optional(pool)
    .await
}

/// True when the error is a Postgres unique-constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
