//! In-memory fakes for the pipeline's collaborators.
//!
//! Enabled for this crate's own tests and, through the `test-helpers` feature, for
//! downstream integration tests.

mod fake_runner;
mod mock_repository;
mod mock_storage;

pub use fake_runner::{FakeProcessRunner, ProcessCall};
pub use mock_repository::{sample_video, MockVideoRepository};
pub use mock_storage::{MockStorage, PresignCall, PutCall};
