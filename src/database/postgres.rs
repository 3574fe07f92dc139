use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, PgPool, Postgres};
use tracing::{debug, info};

use super::{ClassStore, StoreError, StoreSession};
use crate::config::DatabaseConfig;
use crate::models::{
    CreateAction, DeleteAction, HomeworkItem, MaterialItem, NewsItem, Snapshot, Student,
    UpdateAction,
};

/// Postgres-backed store over a `sqlx` pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;
        let redacted = redact_database_url(url)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect(url)
            .await?;

        info!("Connected to database {}", redacted);
        Ok(Self { pool })
    }

    /// Wrap an existing pool, e.g. one with a per-test search path
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the bundled schema migrations
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}

#[async_trait]
impl ClassStore for PgStore {
    async fn open(&self) -> Result<Box<dyn StoreSession>, StoreError> {
        let conn = self.pool.acquire().await?;
        debug!("Database session opened");
        Ok(Box::new(PgSession { conn }))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Holds one pooled connection; dropping it hands the connection back on every exit path
pub struct PgSession {
    conn: PoolConnection<Postgres>,
}

#[async_trait]
impl StoreSession for PgSession {
    async fn snapshot(&mut self) -> Result<Snapshot, StoreError> {
        let class_photo: Option<Option<String>> =
            sqlx::query_scalar("SELECT photo_url FROM class_info LIMIT 1")
                .fetch_optional(&mut *self.conn)
                .await?;

        let news_items = sqlx::query_as::<_, NewsItem>(
            "SELECT id, title, content, date FROM news ORDER BY id",
        )
        .fetch_all(&mut *self.conn)
        .await?;

        let students = sqlx::query_as::<_, Student>("SELECT id, name FROM students ORDER BY id")
            .fetch_all(&mut *self.conn)
            .await?;

        let homework_items = sqlx::query_as::<_, HomeworkItem>(
            "SELECT id, subject, task, due, status FROM homework ORDER BY id",
        )
        .fetch_all(&mut *self.conn)
        .await?;

        let material_items = sqlx::query_as::<_, MaterialItem>(
            "SELECT id, title, type, size, file_url FROM materials ORDER BY id",
        )
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(Snapshot {
            class_photo: class_photo.flatten(),
            news_items,
            students,
            homework_items,
            material_items,
        })
    }

    async fn create(&mut self, action: &CreateAction) -> Result<i32, StoreError> {
        let mut tx = self.conn.begin().await?;

        let id: i32 = match action {
            CreateAction::News(news) => {
                sqlx::query_scalar(
                    "INSERT INTO news (title, content, date) VALUES ($1, $2, $3) RETURNING id",
                )
                .bind(&news.title)
                .bind(&news.content)
                .bind(&news.date)
                .fetch_one(&mut *tx)
                .await?
            }
            CreateAction::Student(student) => {
                sqlx::query_scalar("INSERT INTO students (name) VALUES ($1) RETURNING id")
                    .bind(&student.name)
                    .fetch_one(&mut *tx)
                    .await?
            }
            CreateAction::Homework(hw) => {
                sqlx::query_scalar(
                    "INSERT INTO homework (subject, task, due, status) VALUES ($1, $2, $3, $4) RETURNING id",
                )
                .bind(&hw.subject)
                .bind(&hw.task)
                .bind(&hw.due)
                .bind(&hw.status)
                .fetch_one(&mut *tx)
                .await?
            }
            CreateAction::Material(material) => {
                sqlx::query_scalar(
                    "INSERT INTO materials (title, type, size, file_url) VALUES ($1, $2, $3, $4) RETURNING id",
                )
                .bind(&material.title)
                .bind(&material.kind)
                .bind(&material.size)
                .bind(&material.file_url)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        Ok(id)
    }

    async fn update(&mut self, action: &UpdateAction) -> Result<u64, StoreError> {
        let mut tx = self.conn.begin().await?;

        let result = match action {
            UpdateAction::Photo(photo) => {
                // Singleton row: the unique index on a constant turns this into an upsert
                sqlx::query(
                    "INSERT INTO class_info (photo_url) VALUES ($1) \
                     ON CONFLICT ((true)) DO UPDATE SET photo_url = EXCLUDED.photo_url",
                )
                .bind(&photo.photo_url)
                .execute(&mut *tx)
                .await?
            }
            UpdateAction::News(news) => {
                sqlx::query("UPDATE news SET title = $1, content = $2 WHERE id = $3")
                    .bind(&news.title)
                    .bind(&news.content)
                    .bind(news.id)
                    .execute(&mut *tx)
                    .await?
            }
            UpdateAction::Student(student) => {
                sqlx::query("UPDATE students SET name = $1 WHERE id = $2")
                    .bind(&student.name)
                    .bind(student.id)
                    .execute(&mut *tx)
                    .await?
            }
            UpdateAction::Homework(hw) => {
                sqlx::query(
                    "UPDATE homework SET subject = $1, task = $2, due = $3, status = $4 WHERE id = $5",
                )
                .bind(&hw.subject)
                .bind(&hw.task)
                .bind(&hw.due)
                .bind(&hw.status)
                .bind(hw.id)
                .execute(&mut *tx)
                .await?
            }
            UpdateAction::Material(material) => {
                sqlx::query("UPDATE materials SET title = $1 WHERE id = $2")
                    .bind(&material.title)
                    .bind(material.id)
                    .execute(&mut *tx)
                    .await?
            }
        };

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn delete(&mut self, action: DeleteAction) -> Result<u64, StoreError> {
        // Table names come from a closed enum, never from the request
        let sql = format!("DELETE FROM {} WHERE id = $1", action.collection.table_name());

        let mut tx = self.conn.begin().await?;
        let result = sqlx::query(&sql).bind(action.id).execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }
}

/// Connection string with the password masked, for logs
pub fn redact_database_url(raw: &str) -> Result<String, StoreError> {
    let mut url = url::Url::parse(raw).map_err(|_| StoreError::InvalidDatabaseUrl)?;
    if url.password().is_some() {
        url.set_password(Some("***"))
            .map_err(|_| StoreError::InvalidDatabaseUrl)?;
    }
    Ok(url.into())
}
