// Stockroom - Core library
// Exposes all modules for use in CLI, API server, and tests

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod schema;

#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use api::{
    ErrorBody, LoginRequest, LoginResponse, MeResponse, TestResponse, UserInfo, TEST_MESSAGE,
};
pub use auth::SessionStore;
pub use config::Config;
pub use db::{
    entity_count, find_user_by_username, insert_entities, insert_entity, insert_material,
    insert_user, list_entities, list_materials, load_entities_csv, setup_schema, Database,
    ImportSummary,
};
pub use entities::{EntityKind, Material, NamedEntity, User};
pub use error::{ApiError, StoreError};
pub use schema::{
    check_in_clause, enumeration_values, Role, UnitOfMeasure, UNITS_OF_MEASURE, USER_ROLES,
};

#[cfg(feature = "client")]
pub use client::ApiClient;
#[cfg(feature = "server")]
pub use server::{app, serve, AppState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
