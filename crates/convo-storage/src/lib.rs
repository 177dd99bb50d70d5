//! convo-storage
//!
//! Conditional-write object storage. A thin `ObjectStore` seam with an S3
//! binding, an in-process binding, and a deadline decorator.

pub mod client;
pub mod error;
pub mod generation;
pub mod memory;
pub mod s3;
pub mod store;
pub mod timeout;

pub use error::StorageError;
pub use generation::Generation;
pub use memory::InMemoryObjectStore;
pub use s3::S3ObjectStore;
pub use store::{ObjectStore, ReadOutput, SignedUrlMethod};
pub use timeout::{DEFAULT_STORAGE_TIMEOUT, TimeoutStore};
