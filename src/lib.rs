//! JSON CRUD service for todo items.
//!
//! - [`db`]: the persistence port and its SQLite adapter
//! - [`model`]: the `Todo` record and its repository
//! - [`handler`] / [`route`]: HTTP surface
//! - [`config`]: environment configuration

use std::sync::Arc;

pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod model;
pub mod route;
pub mod schema;

pub use config::Config;
pub use route::create_router;

use db::Database;
use model::TodoRepository;

// Struct representing the application state
pub struct AppState {
    pub db: Arc<dyn Database>,
}

impl AppState {
    pub fn todos(&self) -> TodoRepository<'_> {
        TodoRepository::new(self.db.as_ref())
    }
}
