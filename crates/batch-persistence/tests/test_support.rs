use batch_persistence::config::DbConfig;
use batch_persistence::pg::{build_pool, PgPool};
use diesel::prelude::*;
use once_cell::sync::Lazy;

pub static TEST_POOL: Lazy<Option<PgPool>> = Lazy::new(|| {
    if std::env::var("DATABASE_URL").is_err() {
        return None;
    }
    let cfg = DbConfig::from_env();
    match build_pool(&cfg.url, 1, 1) {
        // usar 1x1 estable
        Ok(p) => Some(p),
        Err(e) => {
            eprintln!("No se pudo construir pool de test: {e}");
            None
        }
    }
});

pub fn with_pool<F, R>(f: F) -> Option<R>
    where F: FnOnce(&PgPool) -> R
{
    TEST_POOL.as_ref().map(|p| f(p))
}

/// Reset explícito estilo arena: borra las filas de los execution_id que el
/// test va a usar, para que cada caso parta de estado Absent sin depender de
/// rollback transaccional. Los tests corren en paralelo, así que cada uno usa
/// su propio rango de ids y resetea solo ese rango.
pub fn reset_identities(pool: &PgPool, ids: &[i64]) {
    use batch_persistence::schema::batch_execution_context::dsl::*;
    let mut conn = pool.get().expect("conn for reset");
    diesel::delete(batch_execution_context.filter(execution_id.eq_any(ids.iter().copied())))
        .execute(&mut conn)
        .expect("reset rows");
}
