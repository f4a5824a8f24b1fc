pub mod books;
pub mod media_serve;
pub mod stats;
pub mod upload;
pub mod videos;
