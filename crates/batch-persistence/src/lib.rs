//! batch-persistence
//!
//! Implementación Postgres (Diesel) del contrato `ContextStore` de
//! `batch-core`, más utilidades de conexión, configuración y migraciones.
//!
//! Módulos:
//! - `pg`: `PgContextStore` sobre la tabla `batch_execution_context`.
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde .env.
//! - `schema`: tabla Diesel declarada para compilar queries.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::init_dotenv;
pub use error::PersistenceError;
pub use pg::{build_dev_pool_from_env, build_pool, ConnectionProvider, PgContextStore, PgPool, PoolProvider};
