pub mod entities;
pub mod requests;
pub mod responses;

pub use entities::{Collection, HomeworkItem, MaterialItem, NewsItem, Snapshot, Student};
pub use requests::{ActionError, CreateAction, DeleteAction, UpdateAction};
pub use responses::{CreatedResponse, SuccessResponse, VerifyResponse};
