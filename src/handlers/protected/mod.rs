// Handlers behind the shared-secret gate

pub mod class_data;

pub use class_data::{
    bad_request, create_post, delete as delete_record, snapshot_get, update_put, DataState,
};
