//! Modelos neutrales (ExecutionContext, ContextValue).

pub mod context;
pub mod value;

pub use context::ExecutionContext;
pub use value::ContextValue;
