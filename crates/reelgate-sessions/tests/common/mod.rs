//! Shared test fixtures

pub mod mock_store;

pub use mock_store::MemorySessionStore;
