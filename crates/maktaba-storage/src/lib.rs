//! Maktaba Storage
//!
//! Storage abstraction for uploaded library files (book PDFs, video files).
//! Keys are relative paths under a private upload root
//! (e.g. `books/12/3f2a….pdf`); the local backend refuses any key that would
//! resolve outside that root.

pub mod local;
pub mod traits;

pub use local::LocalStorage;
pub use traits::{ByteStream, FileMetadata, Storage, StorageError, StorageResult};
