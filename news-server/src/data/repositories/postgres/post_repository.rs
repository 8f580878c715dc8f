use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::data::post_repository::{NewPost, PostPatch, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::post::{ListVisibility, Post};

#[derive(Debug, Clone)]
pub(crate) struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    title: String,
    author: String,
    content: String,
    image_url: Option<String>,
    is_pinned: bool,
    published: bool,
    deleted: bool,
    display_order: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const LIST_PUBLIC_SQL: &str = r#"
    SELECT id, title, author, content, image_url, is_pinned, published, deleted,
           display_order, created_at, updated_at
    FROM news_posts
    WHERE published = TRUE AND deleted = FALSE
    ORDER BY is_pinned DESC NULLS LAST, display_order ASC NULLS LAST, created_at DESC NULLS LAST
"#;

const LIST_ADMIN_SQL: &str = r#"
    SELECT id, title, author, content, image_url, is_pinned, published, deleted,
           display_order, created_at, updated_at
    FROM news_posts
    WHERE deleted = FALSE
    ORDER BY is_pinned DESC NULLS LAST, display_order ASC NULLS LAST, created_at DESC NULLS LAST
"#;

const LIST_ALL_SQL: &str = r#"
    SELECT id, title, author, content, image_url, is_pinned, published, deleted,
           display_order, created_at, updated_at
    FROM news_posts
    ORDER BY is_pinned DESC NULLS LAST, display_order ASC NULLS LAST, created_at DESC NULLS LAST
"#;

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_post_db_error)?;

        if input.is_pinned {
            unpin_others(&mut tx, None).await?;
        }

        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO news_posts (title, author, content, image_url, is_pinned, published, display_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, author, content, image_url, is_pinned, published, deleted,
                      display_order, created_at, updated_at
            "#,
        )
        .bind(&input.title)
        .bind(&input.author)
        .bind(&input.content)
        .bind(&input.image_url)
        .bind(input.is_pinned)
        .bind(input.published)
        .bind(input.display_order)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_post_db_error)?;

        tx.commit().await.map_err(map_post_db_error)?;

        Ok(map_row_to_post(row))
    }

    async fn update_post(&self, id: Uuid, patch: PostPatch) -> Result<Option<Post>, DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_post_db_error)?;

        if patch.is_pinned == Some(true) {
            unpin_others(&mut tx, Some(id)).await?;
        }

        let (set_image, image_url) = match patch.image_url {
            Some(image_url) => (true, image_url),
            None => (false, None),
        };

        let row = sqlx::query_as::<_, PostRow>(
            r#"
            UPDATE news_posts
            SET title = COALESCE($2, title),
                author = COALESCE($3, author),
                content = COALESCE($4, content),
                image_url = CASE WHEN $5 THEN $6 ELSE image_url END,
                is_pinned = COALESCE($7, is_pinned),
                published = COALESCE($8, published),
                deleted = COALESCE($9, deleted),
                display_order = COALESCE($10, display_order),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, author, content, image_url, is_pinned, published, deleted,
                      display_order, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.author)
        .bind(&patch.content)
        .bind(set_image)
        .bind(&image_url)
        .bind(patch.is_pinned)
        .bind(patch.published)
        .bind(patch.deleted)
        .bind(patch.display_order)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_post_db_error)?;

        // dropping the transaction rolls back the unpin when the id is unknown
        let Some(row) = row else {
            return Ok(None);
        };

        tx.commit().await.map_err(map_post_db_error)?;

        Ok(Some(map_row_to_post(row)))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM news_posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_posts(&self, visibility: ListVisibility) -> Result<Vec<Post>, DomainError> {
        let sql = match visibility {
            ListVisibility::Public => LIST_PUBLIC_SQL,
            ListVisibility::Admin => LIST_ADMIN_SQL,
            ListVisibility::Everything => LIST_ALL_SQL,
        };

        let rows = sqlx::query_as::<_, PostRow>(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_post_db_error)?;

        Ok(rows.into_iter().map(map_row_to_post).collect())
    }

    async fn count_active_posts(&self) -> Result<i64, DomainError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM news_posts
            WHERE deleted = FALSE
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(map_post_db_error)
    }

    async fn reorder_posts(&self, ids: &[Uuid]) -> Result<u64, DomainError> {
        if ids.is_empty() {
            return Ok(0);
        }

        // one statement, so either every position is written or none is
        let result = sqlx::query(
            r#"
            UPDATE news_posts AS p
            SET display_order = (o.position - 1)::int
            FROM UNNEST($1::uuid[]) WITH ORDINALITY AS o(id, position)
            WHERE p.id = o.id
            "#,
        )
        .bind(ids)
        .execute(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Ok(result.rows_affected())
    }
}

async fn unpin_others(
    tx: &mut Transaction<'_, Postgres>,
    keep: Option<Uuid>,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        UPDATE news_posts
        SET is_pinned = FALSE,
            updated_at = NOW()
        WHERE is_pinned AND ($1::uuid IS NULL OR id <> $1)
        "#,
    )
    .bind(keep)
    .execute(&mut **tx)
    .await
    .map_err(map_post_db_error)?;

    Ok(())
}

fn map_row_to_post(row: PostRow) -> Post {
    Post {
        id: row.id,
        title: row.title,
        author: row.author,
        content: row.content,
        image_url: row.image_url,
        is_pinned: row.is_pinned,
        published: row.published,
        deleted: row.deleted,
        display_order: row.display_order,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
    .from_storage()
}

fn map_post_db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return DomainError::Storage("another post is already pinned".to_string());
        }
        return DomainError::Storage(db_err.message().to_string());
    }
    DomainError::Storage(err.to_string())
}
