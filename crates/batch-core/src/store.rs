//! Contrato de persistencia de contextos y backend in-memory de paridad.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::codec::{decode_entries, encode_entries, ContextRecord};
use crate::errors::StoreError;
use crate::identity::{ContextScope, ExecutionIdentity};
use crate::model::ExecutionContext;

/// Persistencia de un contexto por identidad de ejecución.
///
/// Máquina de estados por identidad: Absent --save--> Present
/// --update--> Present. `update` antes de `save` es `RecordNotFound`;
/// `save` repetido es `DuplicateRecord`. No hay delete: la limpieza pertenece
/// al ciclo de vida de los registros de ejecución, no a este contrato.
pub trait ContextStore {
    /// Persiste el contexto como registro nuevo. Falla con `DuplicateRecord`
    /// si ya existe uno para esta identidad.
    fn save(&mut self, identity: ExecutionIdentity, context: &ExecutionContext) -> Result<(), StoreError>;

    /// Reemplaza por completo las entradas del registro existente (nunca un
    /// merge). Falla con `RecordNotFound` si no hubo `save` previo.
    fn update(&mut self, identity: ExecutionIdentity, context: &ExecutionContext) -> Result<(), StoreError>;

    /// Recupera y decodifica el contexto. Un registro guardado vacío devuelve
    /// un contexto vacío, no un error.
    fn get(&self, identity: ExecutionIdentity) -> Result<ExecutionContext, StoreError>;
}

/// Backend in-memory con paridad de contrato exacta respecto al backend
/// Postgres. Guarda el `ContextRecord` *codificado* para que ambos caminos
/// del codec se ejerciten igual que contra la base.
pub struct InMemoryContextStore {
    inner: HashMap<(i64, ContextScope), ContextRecord>,
}

impl InMemoryContextStore {
    pub fn new() -> Self {
        Self { inner: HashMap::new() }
    }
}

impl Default for InMemoryContextStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextStore for InMemoryContextStore {
    fn save(&mut self, identity: ExecutionIdentity, context: &ExecutionContext) -> Result<(), StoreError> {
        match self.inner.entry((identity.execution_id, identity.scope)) {
            Entry::Occupied(_) => Err(StoreError::duplicate(identity)),
            Entry::Vacant(slot) => {
                slot.insert(ContextRecord::new(identity, context));
                Ok(())
            }
        }
    }

    fn update(&mut self, identity: ExecutionIdentity, context: &ExecutionContext) -> Result<(), StoreError> {
        match self.inner.get_mut(&(identity.execution_id, identity.scope)) {
            Some(record) => {
                record.entries = encode_entries(context);
                Ok(())
            }
            None => Err(StoreError::not_found(identity)),
        }
    }

    fn get(&self, identity: ExecutionIdentity) -> Result<ExecutionContext, StoreError> {
        self.inner
            .get(&(identity.execution_id, identity.scope))
            .map(|record| decode_entries(&record.entries))
            .ok_or_else(|| StoreError::not_found(identity))
    }
}
