pub mod codec;
pub mod filter;
pub mod ids;
pub mod store;

// Re-export key types
pub use filter::{Filter, FilterValue, Operator};
pub use ids::{IdGenerator, UuidGenerator};
pub use store::DocumentStore;
