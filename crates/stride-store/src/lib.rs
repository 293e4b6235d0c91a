//! # stride-store
//!
//! SQLite-backed persistence for the Stride bot: chat identities,
//! accounts, goal categories, and goals.

mod store;

pub use store::Store;
