pub mod upload_handlers;
pub mod upload_storage;

pub use upload_storage::{UploadKind, UploadStorage};
