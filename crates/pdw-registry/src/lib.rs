//! On-chain ownership registry client (C7): typed transaction builders that
//! never sign, plus reads against memory records, index roots, and access
//! grants.

mod client;
mod txbuilder;

pub use client::ChainRegistryClient;
