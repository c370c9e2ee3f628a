//! Errores del core: accesores tipados, resolución de identidad y contrato
//! del store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::{ContextScope, ExecutionIdentity};

/// Errores de `ExecutionContext` y de resolución de identidad.
#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum ContextError {
    #[error("key not found: {0}")]
    KeyNotFound(String),
    #[error("type mismatch for key '{key}': expected {expected}, found {found}")]
    TypeMismatch { key: String, expected: &'static str, found: &'static str },
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
    #[error("serialization: {0}")]
    Serialization(String),
}

/// Errores del contrato `ContextStore`.
///
/// `DuplicateRecord` y `RecordNotFound` señalan violaciones del orden
/// save-antes-de-update; son errores de programación del caller, nunca
/// condiciones transitorias a reintentar.
#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum StoreError {
    #[error("duplicate record for execution {execution_id} ({scope})")]
    DuplicateRecord { execution_id: i64, scope: ContextScope },
    #[error("record not found for execution {execution_id} ({scope})")]
    RecordNotFound { execution_id: i64, scope: ContextScope },
    #[error("serialization: {0}")]
    Serialization(String),
    #[error("storage backend: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn duplicate(identity: ExecutionIdentity) -> Self {
        Self::DuplicateRecord { execution_id: identity.execution_id, scope: identity.scope }
    }
    pub fn not_found(identity: ExecutionIdentity) -> Self {
        Self::RecordNotFound { execution_id: identity.execution_id, scope: identity.scope }
    }
}
