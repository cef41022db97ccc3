//! Durable key-value storage for the client

mod file_store;

pub use file_store::{default_data_dir, FileStore, TOKEN_FILE_NAME};
