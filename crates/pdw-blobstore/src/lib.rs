//! Content-addressed blob store client (C6).

mod store;

pub use store::BlobStore;
