// Store tests against a real Postgres. Skipped unless DATABASE_URL is set.
// Each test migrates into its own schema and drops it afterwards.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};

use class_site_api::database::{ClassStore, PgStore};
use class_site_api::models::requests::{
    MaterialUpdate, NewHomework, NewMaterial, NewNews, NewStudent, PhotoUpdate,
};
use class_site_api::models::{Collection, CreateAction, DeleteAction, UpdateAction};

static SCHEMA_SEQ: AtomicUsize = AtomicUsize::new(0);

struct PgFixture {
    store: PgStore,
    admin: PgPool,
    schema: String,
}

impl PgFixture {
    async fn start() -> Result<Option<Self>> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping Postgres store test");
            return Ok(None);
        };

        let schema = format!(
            "class_site_test_{}_{}_{}",
            std::process::id(),
            chrono::Utc::now().timestamp_micros(),
            SCHEMA_SEQ.fetch_add(1, Ordering::SeqCst)
        );

        let admin = PgPool::connect(&url).await.context("failed to connect admin pool")?;
        admin
            .execute(format!("CREATE SCHEMA {}", schema).as_str())
            .await
            .context("failed to create test schema")?;

        let search_path = format!("SET search_path TO {}", schema);
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .after_connect(move |conn, _meta| {
                let search_path = search_path.clone();
                Box::pin(async move {
                    conn.execute(search_path.as_str()).await?;
                    Ok(())
                })
            })
            .connect(&url)
            .await
            .context("failed to connect test pool")?;

        let store = PgStore::from_pool(pool);
        store.migrate().await.context("failed to migrate test schema")?;

        Ok(Some(Self { store, admin, schema }))
    }

    async fn count(&self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}.{}", self.schema, table);
        Ok(sqlx::query_scalar(&sql).fetch_one(&self.admin).await?)
    }

    async fn finish(self) -> Result<()> {
        self.store.close().await;
        self.admin
            .execute(format!("DROP SCHEMA {} CASCADE", self.schema).as_str())
            .await?;
        Ok(())
    }
}

fn photo(url: Option<&str>) -> UpdateAction {
    UpdateAction::Photo(PhotoUpdate {
        photo_url: url.map(str::to_string),
    })
}

#[tokio::test]
async fn photo_upsert_keeps_a_single_row() -> Result<()> {
    let Some(fx) = PgFixture::start().await? else {
        return Ok(());
    };
    let mut session = fx.store.open().await?;

    assert_eq!(session.snapshot().await?.class_photo, None);
    assert_eq!(fx.count("class_info").await?, 0);

    session.update(&photo(Some("https://img/1.jpg"))).await?;
    session.update(&photo(Some("https://img/2.jpg"))).await?;
    assert_eq!(fx.count("class_info").await?, 1);
    assert_eq!(
        session.snapshot().await?.class_photo.as_deref(),
        Some("https://img/2.jpg")
    );

    // null clears the photo but keeps the row
    session.update(&photo(None)).await?;
    assert_eq!(fx.count("class_info").await?, 1);
    assert_eq!(session.snapshot().await?.class_photo, None);

    drop(session);
    fx.finish().await
}

#[tokio::test]
async fn concurrent_first_photo_writes_both_succeed() -> Result<()> {
    let Some(fx) = PgFixture::start().await? else {
        return Ok(());
    };
    let mut first = fx.store.open().await?;
    let mut second = fx.store.open().await?;

    let a = photo(Some("a.jpg"));
    let b = photo(Some("b.jpg"));
    let (ra, rb) = tokio::join!(first.update(&a), second.update(&b));
    ra?;
    rb?;

    assert_eq!(fx.count("class_info").await?, 1);
    let current = first.snapshot().await?.class_photo;
    assert!(matches!(current.as_deref(), Some("a.jpg") | Some("b.jpg")));

    drop(first);
    drop(second);
    fx.finish().await
}

#[tokio::test]
async fn listings_are_ordered_by_id_and_ids_are_not_reused() -> Result<()> {
    let Some(fx) = PgFixture::start().await? else {
        return Ok(());
    };
    let mut session = fx.store.open().await?;

    for name in ["Zoe", "Adam", "Mia"] {
        session
            .create(&CreateAction::Student(NewStudent { name: name.into() }))
            .await?;
    }
    let removed = session
        .delete(DeleteAction { collection: Collection::Students, id: 3 })
        .await?;
    assert_eq!(removed, 1);
    let id = session
        .create(&CreateAction::Student(NewStudent { name: "Ivan".into() }))
        .await?;
    assert_eq!(id, 4);

    let snapshot = session.snapshot().await?;
    let names: Vec<(i32, &str)> = snapshot
        .students
        .iter()
        .map(|s| (s.id, s.name.as_str()))
        .collect();
    assert_eq!(names, vec![(1, "Zoe"), (2, "Adam"), (4, "Ivan")]);

    drop(session);
    fx.finish().await
}

#[tokio::test]
async fn delete_is_idempotent() -> Result<()> {
    let Some(fx) = PgFixture::start().await? else {
        return Ok(());
    };
    let mut session = fx.store.open().await?;

    let id = session
        .create(&CreateAction::News(NewNews {
            title: "Trip".into(),
            content: "Museum on Friday".into(),
            date: "2024-09-01".into(),
        }))
        .await?;

    let delete = DeleteAction { collection: Collection::News, id };
    assert_eq!(session.delete(delete).await?, 1);
    assert_eq!(session.delete(delete).await?, 0);
    assert_eq!(fx.count("news").await?, 0);

    drop(session);
    fx.finish().await
}

#[tokio::test]
async fn material_update_only_touches_title() -> Result<()> {
    let Some(fx) = PgFixture::start().await? else {
        return Ok(());
    };
    let mut session = fx.store.open().await?;

    let id = session
        .create(&CreateAction::Material(NewMaterial {
            title: "Reading list".into(),
            kind: "pdf".into(),
            size: "120 KB".into(),
            file_url: None,
        }))
        .await?;

    let touched = session
        .update(&UpdateAction::Material(MaterialUpdate { id, title: "Summer reading".into() }))
        .await?;
    assert_eq!(touched, 1);

    let missing = session
        .update(&UpdateAction::Material(MaterialUpdate { id: id + 100, title: "x".into() }))
        .await?;
    assert_eq!(missing, 0);

    let snapshot = session.snapshot().await?;
    let material = &snapshot.material_items[0];
    assert_eq!(material.title, "Summer reading");
    assert_eq!(material.kind, "pdf");
    assert_eq!(material.size, "120 KB");
    assert_eq!(material.file_url, None);

    drop(session);
    fx.finish().await
}

#[tokio::test]
async fn homework_keeps_the_given_status() -> Result<()> {
    let Some(fx) = PgFixture::start().await? else {
        return Ok(());
    };
    let mut session = fx.store.open().await?;

    session
        .create(&CreateAction::Homework(NewHomework {
            subject: "Math".into(),
            task: "Exercises 1-10".into(),
            due: "2024-09-10".into(),
            status: "pending".into(),
        }))
        .await?;

    let snapshot = session.snapshot().await?;
    assert_eq!(snapshot.homework_items.len(), 1);
    assert_eq!(snapshot.homework_items[0].status, "pending");
    assert_eq!(snapshot.homework_items[0].subject, "Math");

    drop(session);
    fx.finish().await
}
