//! SQLite persistence helpers shared across stores.

mod versioned_schema;

pub use versioned_schema::*;
