//! batch-core: sustrato de persistencia de contextos de ejecución.
//!
//! Núcleo neutral respecto al storage: el mapa tipado `ExecutionContext`, la
//! resolución de identidad job/step, el codec hacia la forma persistible y el
//! contrato `ContextStore` con un backend in-memory de paridad. La
//! implementación durable (Postgres) vive en `batch-persistence`.

pub mod codec;
pub mod errors;
pub mod identity;
pub mod model;
pub mod store;

pub use codec::{decode_entries, encode_entries, ContextEntry, ContextRecord};
pub use errors::{ContextError, StoreError};
pub use identity::{ContextScope, ExecutionIdentity, JobExecution, StepExecution};
pub use model::{ContextValue, ExecutionContext};
pub use store::{ContextStore, InMemoryContextStore};
