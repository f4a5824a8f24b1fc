pub mod books;
pub mod resolver;
pub mod stats;
pub mod taxonomy;
pub mod transaction;
pub mod videos;
