use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use super::entities::Collection;

/// Status given to homework when the client does not send one
pub const DEFAULT_HOMEWORK_STATUS: &str = "pending";

/// Failures while turning a raw request into a typed action
#[derive(Debug, Error)]
pub enum ActionError {
    /// Unknown action, missing action, or an envelope that is not an object
    #[error("Bad request")]
    Unsupported,

    #[error("Invalid JSON body: {0}")]
    InvalidJson(String),

    #[error("Invalid data for {action}: {message}")]
    InvalidPayload { action: &'static str, message: String },

    #[error("Invalid id: {0:?}")]
    InvalidId(Option<String>),
}

/// `{ "action": ..., "data": ... }` as sent with POST and PUT
#[derive(Debug, Default, Deserialize)]
pub struct ActionEnvelope {
    pub action: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl ActionEnvelope {
    /// An empty body is read as `{}`
    pub fn from_slice(body: &[u8]) -> Result<Self, ActionError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let value: Value =
            serde_json::from_slice(body).map_err(|e| ActionError::InvalidJson(e.to_string()))?;
        serde_json::from_value(value).map_err(|_| ActionError::Unsupported)
    }
}

/// Query string carried by DELETE
#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    pub action: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewNews {
    pub title: String,
    pub content: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewStudent {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewHomework {
    pub subject: String,
    pub task: String,
    pub due: String,
    #[serde(default = "default_status", deserialize_with = "status_or_default")]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewMaterial {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub size: String,
    #[serde(default)]
    pub file_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PhotoUpdate {
    /// Must be present; `null` clears the photo
    #[serde(deserialize_with = "required_nullable")]
    pub photo_url: Option<String>,
}

/// Date is deliberately not updatable
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewsUpdate {
    pub id: i32,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StudentUpdate {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HomeworkUpdate {
    pub id: i32,
    pub subject: String,
    pub task: String,
    pub due: String,
    #[serde(default = "default_status", deserialize_with = "status_or_default")]
    pub status: String,
}

/// Only the title of a material can change; type, size and file_url are fixed at creation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MaterialUpdate {
    pub id: i32,
    pub title: String,
}

/// Inserts accepted by POST
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateAction {
    News(NewNews),
    Student(NewStudent),
    Homework(NewHomework),
    Material(NewMaterial),
}

impl CreateAction {
    pub fn parse(action: Option<&str>, data: Value) -> Result<Self, ActionError> {
        match action {
            Some("add_news") => decode("add_news", data).map(Self::News),
            Some("add_student") => decode("add_student", data).map(Self::Student),
            Some("add_homework") => decode("add_homework", data).map(Self::Homework),
            Some("add_material") => decode("add_material", data).map(Self::Material),
            _ => Err(ActionError::Unsupported),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::News(_) => "add_news",
            Self::Student(_) => "add_student",
            Self::Homework(_) => "add_homework",
            Self::Material(_) => "add_material",
        }
    }

    pub fn collection(&self) -> Collection {
        match self {
            Self::News(_) => Collection::News,
            Self::Student(_) => Collection::Students,
            Self::Homework(_) => Collection::Homework,
            Self::Material(_) => Collection::Materials,
        }
    }
}

/// Updates accepted by PUT
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateAction {
    Photo(PhotoUpdate),
    News(NewsUpdate),
    Student(StudentUpdate),
    Homework(HomeworkUpdate),
    Material(MaterialUpdate),
}

impl UpdateAction {
    pub fn parse(action: Option<&str>, data: Value) -> Result<Self, ActionError> {
        match action {
            Some("update_photo") => decode("update_photo", data).map(Self::Photo),
            Some("update_news") => decode("update_news", data).map(Self::News),
            Some("update_student") => decode("update_student", data).map(Self::Student),
            Some("update_homework") => decode("update_homework", data).map(Self::Homework),
            Some("update_material") => decode("update_material", data).map(Self::Material),
            _ => Err(ActionError::Unsupported),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Photo(_) => "update_photo",
            Self::News(_) => "update_news",
            Self::Student(_) => "update_student",
            Self::Homework(_) => "update_homework",
            Self::Material(_) => "update_material",
        }
    }
}

/// Physical removal of one row, by id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteAction {
    pub collection: Collection,
    pub id: i32,
}

impl DeleteAction {
    pub fn parse(query: DeleteQuery) -> Result<Self, ActionError> {
        let collection = match query.action.as_deref() {
            Some("delete_news") => Collection::News,
            Some("delete_student") => Collection::Students,
            Some("delete_homework") => Collection::Homework,
            Some("delete_material") => Collection::Materials,
            _ => return Err(ActionError::Unsupported),
        };

        let parsed = query
            .id
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i32>().ok());
        let id = parsed.ok_or(ActionError::InvalidId(query.id))?;

        Ok(Self { collection, id })
    }
}

fn decode<T: DeserializeOwned>(action: &'static str, data: Value) -> Result<T, ActionError> {
    serde_json::from_value(data).map_err(|e| ActionError::InvalidPayload {
        action,
        message: e.to_string(),
    })
}

fn default_status() -> String {
    DEFAULT_HOMEWORK_STATUS.to_string()
}

fn status_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_status))
}

// A field with `deserialize_with` and no `default` is required, even for Option
fn required_nullable<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}
