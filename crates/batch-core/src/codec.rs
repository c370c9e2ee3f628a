//! Codec entre `ExecutionContext` y su forma persistible.
//!
//! La forma almacenada es una secuencia de entradas `(key, valor etiquetado)`.
//! Se serializa completa como JSON (los backends la guardan tal cual, p. ej.
//! en una columna JSONB); el discriminante de tipo viaja en cada valor, así
//! que el decode restaura cada entrada con su variante original.
//!
//! Ley de round-trip: `decode_entries(encode_entries(ctx)) == ctx` para todos
//! los tipos soportados, incluido el contexto vacío.

use serde::{Deserialize, Serialize};

use crate::identity::{ContextScope, ExecutionIdentity};
use crate::model::{ContextValue, ExecutionContext};

/// Una entrada persistida: clave más valor etiquetado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub key: String,
    pub value: ContextValue,
}

/// Forma persistida completa de un contexto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRecord {
    pub execution_id: i64,
    pub scope: ContextScope,
    pub entries: Vec<ContextEntry>,
}

impl ContextRecord {
    pub fn new(identity: ExecutionIdentity, context: &ExecutionContext) -> Self {
        Self { execution_id: identity.execution_id,
               scope: identity.scope,
               entries: encode_entries(context) }
    }

    pub fn identity(&self) -> ExecutionIdentity {
        ExecutionIdentity { execution_id: self.execution_id, scope: self.scope }
    }
}

/// Codifica las entradas de un contexto, ordenadas por clave.
///
/// El orden no es observable a través de la igualdad de contextos; se fija
/// solo para que la representación persistida sea determinista.
pub fn encode_entries(context: &ExecutionContext) -> Vec<ContextEntry> {
    let mut entries: Vec<ContextEntry> =
        context.iter()
               .map(|(k, v)| ContextEntry { key: k.to_string(), value: v.clone() })
               .collect();
    entries.sort_by(|a, b| a.key.cmp(&b.key));
    entries
}

/// Reconstruye un contexto desde entradas persistidas. El resultado es un
/// contexto limpio (no dirty): decodificar no es una mutación del caller.
pub fn decode_entries(entries: &[ContextEntry]) -> ExecutionContext {
    entries.iter().map(|e| (e.key.clone(), e.value.clone())).collect()
}
