use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{ClassStore, StoreError, StoreSession};
use crate::models::{
    Collection, CreateAction, DeleteAction, HomeworkItem, MaterialItem, NewsItem, Snapshot,
    Student, UpdateAction,
};

/// In-process store with the same semantics as the Postgres schema:
/// serial ids that are never reused, id-ordered listings, a singleton
/// class photo row. Used by tests and by `--in-memory` runs.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    sessions_opened: Arc<AtomicUsize>,
}

#[derive(Debug, Default)]
struct Tables {
    /// Outer `Option` is row presence, inner is the nullable column
    class_info: Option<Option<String>>,
    news: BTreeMap<i32, NewsItem>,
    students: BTreeMap<i32, Student>,
    homework: BTreeMap<i32, HomeworkItem>,
    materials: BTreeMap<i32, MaterialItem>,
    sequences: Sequences,
}

#[derive(Debug, Default)]
struct Sequences {
    news: i32,
    students: i32,
    homework: i32,
    materials: i32,
}

impl Sequences {
    fn next(&mut self, collection: Collection) -> i32 {
        let counter = match collection {
            Collection::News => &mut self.news,
            Collection::Students => &mut self.students,
            Collection::Homework => &mut self.homework,
            Collection::Materials => &mut self.materials,
        };
        *counter += 1;
        *counter
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many sessions have been opened since creation
    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    pub async fn row_count(&self, collection: Collection) -> usize {
        let tables = self.tables.lock().await;
        match collection {
            Collection::News => tables.news.len(),
            Collection::Students => tables.students.len(),
            Collection::Homework => tables.homework.len(),
            Collection::Materials => tables.materials.len(),
        }
    }

    pub async fn class_info_rows(&self) -> usize {
        usize::from(self.tables.lock().await.class_info.is_some())
    }
}

#[async_trait]
impl ClassStore for MemoryStore {
    async fn open(&self) -> Result<Box<dyn StoreSession>, StoreError> {
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            tables: Arc::clone(&self.tables),
        }))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub struct MemorySession {
    tables: Arc<Mutex<Tables>>,
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn snapshot(&mut self) -> Result<Snapshot, StoreError> {
        let tables = self.tables.lock().await;
        Ok(Snapshot {
            class_photo: tables.class_info.clone().flatten(),
            news_items: tables.news.values().cloned().collect(),
            students: tables.students.values().cloned().collect(),
            homework_items: tables.homework.values().cloned().collect(),
            material_items: tables.materials.values().cloned().collect(),
        })
    }

    async fn create(&mut self, action: &CreateAction) -> Result<i32, StoreError> {
        let mut tables = self.tables.lock().await;
        let id = tables.sequences.next(action.collection());

        match action {
            CreateAction::News(news) => {
                tables.news.insert(
                    id,
                    NewsItem {
                        id,
                        title: news.title.clone(),
                        content: news.content.clone(),
                        date: news.date.clone(),
                    },
                );
            }
            CreateAction::Student(student) => {
                tables.students.insert(
                    id,
                    Student {
                        id,
                        name: student.name.clone(),
                    },
                );
            }
            CreateAction::Homework(hw) => {
                tables.homework.insert(
                    id,
                    HomeworkItem {
                        id,
                        subject: hw.subject.clone(),
                        task: hw.task.clone(),
                        due: hw.due.clone(),
                        status: hw.status.clone(),
                    },
                );
            }
            CreateAction::Material(material) => {
                tables.materials.insert(
                    id,
                    MaterialItem {
                        id,
                        title: material.title.clone(),
                        kind: material.kind.clone(),
                        size: material.size.clone(),
                        file_url: material.file_url.clone(),
                    },
                );
            }
        }

        Ok(id)
    }

    async fn update(&mut self, action: &UpdateAction) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock().await;

        let touched = match action {
            UpdateAction::Photo(photo) => {
                tables.class_info = Some(photo.photo_url.clone());
                true
            }
            UpdateAction::News(update) => tables
                .news
                .get_mut(&update.id)
                .map(|news| {
                    news.title = update.title.clone();
                    news.content = update.content.clone();
                })
                .is_some(),
            UpdateAction::Student(update) => tables
                .students
                .get_mut(&update.id)
                .map(|student| student.name = update.name.clone())
                .is_some(),
            UpdateAction::Homework(update) => tables
                .homework
                .get_mut(&update.id)
                .map(|hw| {
                    hw.subject = update.subject.clone();
                    hw.task = update.task.clone();
                    hw.due = update.due.clone();
                    hw.status = update.status.clone();
                })
                .is_some(),
            UpdateAction::Material(update) => tables
                .materials
                .get_mut(&update.id)
                .map(|material| material.title = update.title.clone())
                .is_some(),
        };

        Ok(u64::from(touched))
    }

    async fn delete(&mut self, action: DeleteAction) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock().await;
        let removed = match action.collection {
            Collection::News => tables.news.remove(&action.id).is_some(),
            Collection::Students => tables.students.remove(&action.id).is_some(),
            Collection::Homework => tables.homework.remove(&action.id).is_some(),
            Collection::Materials => tables.materials.remove(&action.id).is_some(),
        };
        Ok(u64::from(removed))
    }
}
