//! Maktaba DB
//!
//! Postgres repositories for the library catalog, the find-or-create entity
//! resolver used by book/video writes, and transaction helpers.

pub mod db;

pub use db::books::{BookRepository, BookWrite};
pub use db::resolver::{self, PersonRole};
pub use db::stats::StatsRepository;
pub use db::transaction::with_transaction;
pub use db::videos::{VideoRepository, VideoWrite};
