//! Access/consent engine (C8): context-id derivation, consent request
//! bookkeeping, and grant/revoke/seal-approve transaction builders.

mod consent;
mod engine;

pub use consent::{ConsentRegistry, ConsentRequest, ConsentRequestArgs};
pub use engine::{AccessEngine, ISaltStore};
