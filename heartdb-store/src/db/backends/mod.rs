//! Storage backends behind [`DocumentStore`](super::DocumentStore)

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
