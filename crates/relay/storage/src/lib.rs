//! Push Relay Storage Layer
//!
//! Notification record storage: a Diesel/SQLite backend and an in-memory one.

mod memory;
mod models;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStorage;
pub use models::*;
pub use sqlite::SqliteStorage;
pub use traits::*;

use diesel_migrations::{EmbeddedMigrations, embed_migrations};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");
