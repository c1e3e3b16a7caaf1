//! Database repositories and pool setup
//
// Video metadata records
pub mod video;
//
// Connection pool and migrations
pub mod pool;

pub use pool::setup_database;
pub use video::{PgVideoRepository, VideoRepository};
