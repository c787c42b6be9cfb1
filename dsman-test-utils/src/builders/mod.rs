//! Builders for test scenarios

mod dataset;

pub use dataset::{DatasetFixture, NESTED_COLLECTIONS};
