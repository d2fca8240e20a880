//! Process-local storage backend

mod memory;

pub use memory::InMemoryRepositoryProvider;
