use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::applications::DELETABLE_STATUSES;
use crate::models::application::ApplicationRow;

pub async fn insert_application(pool: &PgPool, user_id: Uuid) -> sqlx::Result<ApplicationRow> {
    sqlx::query_as::<_, ApplicationRow>(
        r#"
        INSERT INTO applications (id, user_id, status, current_step, form_data)
        VALUES ($1, $2, 'draft', 1, '{}'::jsonb)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn find_application(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<ApplicationRow>> {
    sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<ApplicationRow>> {
    sqlx::query_as::<_, ApplicationRow>(
        "SELECT * FROM applications WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Shallow-merges `data` into `form_data[step]` and raises `current_step` to at least
/// `next_step`, in one statement so concurrent saves of different steps both land.
/// Only touches drafts; `None` means the row is not (or no longer) a draft.
pub async fn save_step(
    pool: &PgPool,
    id: Uuid,
    step: &str,
    data: &Value,
    next_step: i32,
) -> sqlx::Result<Option<ApplicationRow>> {
    sqlx::query_as::<_, ApplicationRow>(
        r#"
        UPDATE applications
        SET form_data = jsonb_set(
                CASE WHEN jsonb_typeof(form_data) = 'object' THEN form_data ELSE '{}'::jsonb END,
                ARRAY[$2::text],
                CASE WHEN jsonb_typeof(form_data -> $2::text) = 'object'
                     THEN form_data -> $2::text ELSE '{}'::jsonb END || $3::jsonb
            ),
            current_step = GREATEST(current_step, $4),
            updated_at = NOW()
        WHERE id = $1 AND status = 'draft'
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(step)
    .bind(data)
    .bind(next_step)
    .fetch_optional(pool)
    .await
}

/// Moves a draft to `submitted` with its risk assessment.
pub async fn mark_submitted(
    pool: &PgPool,
    id: Uuid,
    risk_assessment: &Value,
) -> sqlx::Result<Option<ApplicationRow>> {
    sqlx::query_as::<_, ApplicationRow>(
        r#"
        UPDATE applications
        SET status = 'submitted', risk_assessment = $2, submitted_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND status = 'draft'
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(risk_assessment)
    .fetch_optional(pool)
    .await
}

/// Compare-and-set on the status column.
pub async fn set_status(
    pool: &PgPool,
    id: Uuid,
    from: &str,
    to: &str,
) -> sqlx::Result<Option<ApplicationRow>> {
    sqlx::query_as::<_, ApplicationRow>(
        r#"
        UPDATE applications
        SET status = $3, updated_at = NOW()
        WHERE id = $1 AND status = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(from)
    .bind(to)
    .fetch_optional(pool)
    .await
}

/// Deletes the row if it is still in a deletable status; documents go with it through
/// the foreign-key cascade. Returns the storage keys of the deleted documents, or `None`
/// when the row is gone or its status no longer allows deletion.
pub async fn delete_application(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<Vec<String>>> {
    let deletable: Vec<&str> = DELETABLE_STATUSES.iter().map(|s| s.as_str()).collect();
    let mut tx = pool.begin().await?;

    // Row lock keeps submits and document inserts out until commit.
    let locked: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM applications WHERE id = $1 AND status = ANY($2) FOR UPDATE",
    )
    .bind(id)
    .bind(&deletable)
    .fetch_optional(&mut *tx)
    .await?;
    if locked.is_none() {
        return Ok(None);
    }

    let keys: Vec<String> =
        sqlx::query_scalar("SELECT storage_key FROM documents WHERE application_id = $1")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

    sqlx::query("DELETE FROM applications WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Some(keys))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::test_support::{insert_test_user, test_pool};

    async fn draft(pool: &PgPool) -> ApplicationRow {
        let user = insert_test_user(pool).await;
        insert_application(pool, user.id).await.unwrap()
    }

    #[tokio::test]
    #[ignore]
    async fn test_save_step_merges_shallowly_and_keeps_progress() {
        let pool = test_pool().await;
        let app = draft(&pool).await;

        save_step(&pool, app.id, "loan", &json!({"loan_amount": 1, "loan_purpose": "purchase"}), 6)
            .await
            .unwrap()
            .unwrap();
        let row = save_step(&pool, app.id, "personal", &json!({"first_name": "Jane"}), 2)
            .await
            .unwrap()
            .unwrap();
        let row = save_step(&pool, row.id, "loan", &json!({"loan_amount": 2}), 6)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            row.form_data,
            json!({
                "personal": {"first_name": "Jane"},
                "loan": {"loan_amount": 2, "loan_purpose": "purchase"}
            })
        );
        assert_eq!(row.current_step, 6);
    }

    #[tokio::test]
    #[ignore]
    async fn test_concurrent_saves_of_different_steps_both_land() {
        let pool = test_pool().await;
        let app = draft(&pool).await;

        let personal = json!({"first_name": "Jane"});
        let property = json!({"property_value": 600000});
        let (a, b) = tokio::join!(
            save_step(&pool, app.id, "personal", &personal, 2),
            save_step(&pool, app.id, "property", &property, 5),
        );
        a.unwrap();
        b.unwrap();

        let row = find_application(&pool, app.id).await.unwrap().unwrap();
        assert_eq!(row.form_data["personal"]["first_name"], "Jane");
        assert_eq!(row.form_data["property"]["property_value"], 600000);
        assert_eq!(row.current_step, 5);
    }

    #[tokio::test]
    #[ignore]
    async fn test_save_step_ignores_non_drafts() {
        let pool = test_pool().await;
        let app = draft(&pool).await;
        mark_submitted(&pool, app.id, &json!({})).await.unwrap().unwrap();

        let saved = save_step(&pool, app.id, "personal", &json!({"first_name": "X"}), 2)
            .await
            .unwrap();
        assert!(saved.is_none());
    }

    #[tokio::test]
    #[ignore]
    async fn test_delete_refuses_application_submitted_meanwhile() {
        let pool = test_pool().await;
        let app = draft(&pool).await;
        mark_submitted(&pool, app.id, &json!({})).await.unwrap().unwrap();

        assert_eq!(delete_application(&pool, app.id).await.unwrap(), None);
        assert!(find_application(&pool, app.id).await.unwrap().is_some());
    }

    #[tokio::test]
    #[ignore]
    async fn test_delete_draft() {
        let pool = test_pool().await;
        let app = draft(&pool).await;

        assert_eq!(delete_application(&pool, app.id).await.unwrap(), Some(Vec::new()));
        assert!(find_application(&pool, app.id).await.unwrap().is_none());
        assert_eq!(delete_application(&pool, app.id).await.unwrap(), None);
    }
}
