//! Implementación Postgres (Diesel) del contrato `ContextStore`.
//!
//! Objetivo del módulo:
//! - Persistencia durable de contextos con paridad 1:1 respecto al backend
//!   in-memory de `batch-core`: mismo contrato, mismos errores semánticos.
//! - Un registro por `(execution_id, context_type)`, garantizado por la PK
//!   compuesta de la tabla: las carreras de `save` concurrentes las resuelve
//!   la base (unique violation), sin locking a nivel de aplicación.
//! - `update` es reemplazo completo del documento de entradas, nunca merge.
//! - Manejo básico de errores transitorios: reintento con backoff en cada
//!   operación; los errores de contrato (`DuplicateRecord`,
//!   `RecordNotFound`) nunca se reintentan.

use batch_core::codec::{decode_entries, encode_entries, ContextEntry, ContextRecord};
use batch_core::identity::ContextScope;
use batch_core::{ContextStore, ExecutionContext, ExecutionIdentity, StoreError};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use log::{debug, warn};
use serde_json::Value;

use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;
use crate::schema::batch_execution_context;

/// Alias del pool r2d2 de conexiones Postgres.
///
/// Al construirlo con `build_pool` se corre automáticamente el set de
/// migraciones pendientes (una sola vez).
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones.
///
/// Permite inyectar un pool real (producción/tests de integración) o
/// simular en tests unitarios sin acoplar a r2d2.
pub trait ConnectionProvider: Send + Sync + 'static {
    /// Obtiene una conexión lista para ejecutar consultas Diesel.
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError>;
}

/// Implementación concreta de `ConnectionProvider` respaldada por un `PgPool`.
pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

/// Fila completa de `batch_execution_context` para lecturas.
#[derive(Queryable, Debug)]
pub struct ContextRow {
    pub execution_id: i64,
    pub context_type: String,
    pub entries: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fila para insertar en `batch_execution_context`.
/// `created_at`/`updated_at` los asigna la base (DEFAULT now()).
#[derive(Insertable, Debug)]
#[diesel(table_name = batch_execution_context)]
pub struct NewContextRow<'a> {
    pub execution_id: i64,
    pub context_type: &'a str,
    pub entries: &'a Value,
}

/// Determina si un error es transitorio (recomendado reintentar con backoff).
fn is_retryable(e: &PersistenceError) -> bool {
    match e {
        PersistenceError::SerializationConflict => true,
        PersistenceError::TransientIo(_) => true,
        // Algunos mensajes (dependen de driver/pg) llegan como Unknown con
        // texto. Best-effort string match sin acoplar a SQLSTATE.
        PersistenceError::Unknown(msg) => {
            let m = msg.to_lowercase();
            m.contains("deadlock detected")
            || m.contains("could not serialize access due to concurrent update")
            || m.contains("connection closed")
            || m.contains("connection refused")
            || m.contains("timeout")
        }
        _ => false,
    }
}

/// Retry con backoff lineal pequeño (hasta 3 intentos). Sólo repite la unidad
/// de trabajo ante errores transitorios; no altera semántica de negocio.
fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if is_retryable(&e) && attempts < 3 => {
                let delay_ms = 15 * ((attempts + 1) as u64);
                warn!("retryable error (attempt {}): {:?} -> sleeping {}ms",
                      attempts + 1,
                      e,
                      delay_ms);
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

/// Entradas codificadas del contexto como documento JSON para la columna
/// JSONB. El discriminante de tipo viaja dentro de cada valor.
fn encode_payload(context: &ExecutionContext) -> Result<Value, StoreError> {
    serde_json::to_value(encode_entries(context)).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Reconstruye el `ContextRecord` desde una fila, validando el discriminador
/// `context_type` (el CHECK de la tabla ya restringe los valores; esto cubre
/// lecturas de datos manipulados por fuera).
fn record_from_row(row: ContextRow) -> Result<ContextRecord, PersistenceError> {
    let scope = ContextScope::parse(&row.context_type)
        .ok_or_else(|| PersistenceError::Corrupt(format!("unknown context_type '{}'", row.context_type)))?;
    let entries: Vec<ContextEntry> = serde_json::from_value(row.entries)?;
    Ok(ContextRecord { execution_id: row.execution_id, scope, entries })
}

/// Implementación Postgres de `ContextStore`.
///
/// Cada operación es una única sentencia sobre la tabla; la atomicidad por
/// identidad la da la escritura atómica por fila de Postgres, así que no se
/// abren transacciones explícitas.
pub struct PgContextStore<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> PgContextStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: ConnectionProvider> ContextStore for PgContextStore<P> {
    fn save(&mut self, identity: ExecutionIdentity, context: &ExecutionContext) -> Result<(), StoreError> {
        debug!("save:start execution_id={} scope={}", identity.execution_id, identity.scope);
        let payload = encode_payload(context)?;
        let result = with_retry(|| {
            let mut conn = self.provider.connection()?;
            let row = NewContextRow { execution_id: identity.execution_id,
                                      context_type: identity.scope.as_str(),
                                      entries: &payload };
            diesel::insert_into(batch_execution_context::table).values(&row)
                                                               .execute(&mut conn)
                                                               .map_err(PersistenceError::from)?;
            Ok(())
        });
        match result {
            Ok(()) => {
                debug!("save:done execution_id={} scope={}", identity.execution_id, identity.scope);
                Ok(())
            }
            // La PK compuesta ya tenía fila: el caller violó el orden
            // save-antes-de-update o perdió la carrera de save.
            Err(PersistenceError::UniqueViolation(_)) => Err(StoreError::duplicate(identity)),
            Err(e) => Err(e.into()),
        }
    }

    fn update(&mut self, identity: ExecutionIdentity, context: &ExecutionContext) -> Result<(), StoreError> {
        debug!("update:start execution_id={} scope={}", identity.execution_id, identity.scope);
        let payload = encode_payload(context)?;
        let affected = with_retry(|| {
            let mut conn = self.provider.connection()?;
            let target = batch_execution_context::table
                .filter(batch_execution_context::execution_id.eq(identity.execution_id))
                .filter(batch_execution_context::context_type.eq(identity.scope.as_str()));
            diesel::update(target)
                .set((batch_execution_context::entries.eq(&payload),
                      batch_execution_context::updated_at.eq(diesel::dsl::now)))
                .execute(&mut conn)
                .map_err(PersistenceError::from)
        }).map_err(StoreError::from)?;

        if affected == 0 {
            return Err(StoreError::not_found(identity));
        }
        debug!("update:done execution_id={} scope={}", identity.execution_id, identity.scope);
        Ok(())
    }

    fn get(&self, identity: ExecutionIdentity) -> Result<ExecutionContext, StoreError> {
        debug!("get:start execution_id={} scope={}", identity.execution_id, identity.scope);
        let result = with_retry(|| {
            let mut conn = self.provider.connection()?;
            let row: ContextRow = batch_execution_context::table
                .find((identity.execution_id, identity.scope.as_str()))
                .first(&mut conn)
                .map_err(PersistenceError::from)?;
            record_from_row(row)
        });
        match result {
            Ok(record) => {
                debug!("get:done execution_id={} scope={} entries={}",
                       identity.execution_id,
                       identity.scope,
                       record.entries.len());
                Ok(decode_entries(&record.entries))
            }
            Err(PersistenceError::NotFound) => Err(StoreError::not_found(identity)),
            Err(e) => Err(e.into()),
        }
    }
}

/// Construye un pool Postgres r2d2 a partir de URL.
///
/// Valida y ajusta tamaños (si `min_size > max_size`, usa `min = max`) y
/// ejecuta las migraciones pendientes con la primera conexión.
pub fn build_pool(database_url: &str, min_size: u32, max_size: u32) -> Result<PgPool, PersistenceError> {
    let validated_min = min_size.max(1);
    let validated_max = max_size.max(1);
    if validated_min > validated_max {
        warn!("min_size > max_size ({validated_min} > {validated_max}), ajustando min=max");
    }
    let final_min = validated_min.min(validated_max);
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder().min_idle(Some(final_min))
                                    .max_size(validated_max)
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    {
        let mut conn = pool.get()
                           .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
        run_pending_migrations(&mut conn)?;
    }
    Ok(pool)
}

/// Helper de desarrollo: carga `.env`, lee configuración y construye un pool
/// ya migrado.
pub fn build_dev_pool_from_env() -> Result<PgPool, PersistenceError> {
    crate::config::init_dotenv();
    let cfg = crate::config::DbConfig::from_env();
    build_pool(&cfg.url, cfg.min_connections, cfg.max_connections)
}
