use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct NewsItem {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HomeworkItem {
    pub id: i32,
    pub subject: String,
    pub task: String,
    pub due: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MaterialItem {
    pub id: i32,
    pub title: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub size: String,
    pub file_url: Option<String>,
}

/// Full state of the site, returned by the single read operation.
/// Every list is ordered by ascending id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub class_photo: Option<String>,
    pub news_items: Vec<NewsItem>,
    pub students: Vec<Student>,
    pub homework_items: Vec<HomeworkItem>,
    pub material_items: Vec<MaterialItem>,
}

/// The four id-keyed collections. The class photo is a singleton and
/// is not addressable by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    News,
    Students,
    Homework,
    Materials,
}

impl Collection {
    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::News => "news",
            Collection::Students => "students",
            Collection::Homework => "homework",
            Collection::Materials => "materials",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}
