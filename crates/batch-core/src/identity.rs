//! Identidad de almacenamiento de un contexto de ejecución.
//!
//! Un contexto pertenece o bien a una ejecución de job o bien a una ejecución
//! de step. Los espacios de ids son disjuntos: un job y un step pueden
//! compartir el mismo id numérico sin colisionar en el store, porque la clave
//! de almacenamiento es el par (execution_id, scope).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ContextError;

/// Discriminador job/step de un registro de contexto.
///
/// `as_str` es la forma estable en minúsculas que se persiste como
/// `context_type`; no cambiar sin migración.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextScope {
    Job,
    Step,
}

impl ContextScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextScope::Job => "job",
            ContextScope::Step => "step",
        }
    }

    /// Inversa de `as_str`, para filas leídas del store.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "job" => Some(ContextScope::Job),
            "step" => Some(ContextScope::Step),
            _ => None,
        }
    }
}

impl fmt::Display for ContextScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clave compuesta estable bajo la que se persiste un contexto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionIdentity {
    pub execution_id: i64,
    pub scope: ContextScope,
}

impl ExecutionIdentity {
    pub fn job(execution_id: i64) -> Self {
        Self { execution_id, scope: ContextScope::Job }
    }

    pub fn step(execution_id: i64) -> Self {
        Self { execution_id, scope: ContextScope::Step }
    }

    /// Resuelve la identidad de un handle de ejecución de job.
    ///
    /// El id lo asigna el colaborador que persiste los registros de
    /// ejecución; resolver un handle sin id es un error de orden de llamadas.
    pub fn of_job(execution: &JobExecution) -> Result<Self, ContextError> {
        match execution.id {
            Some(id) => Ok(Self::job(id)),
            None => Err(ContextError::PreconditionFailed(format!(
                "job execution '{}' has no assigned id (save the execution record first)",
                execution.job_name
            ))),
        }
    }

    /// Resuelve la identidad de un handle de ejecución de step.
    pub fn of_step(execution: &StepExecution) -> Result<Self, ContextError> {
        match execution.id {
            Some(id) => Ok(Self::step(id)),
            None => Err(ContextError::PreconditionFailed(format!(
                "step execution '{}' has no assigned id (save the execution record first)",
                execution.step_name
            ))),
        }
    }
}

/// Handle mínimo de una ejecución de job, provisto por el colaborador de
/// registros de ejecución. `id` es `None` hasta que dicho colaborador lo
/// persiste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobExecution {
    pub id: Option<i64>,
    pub job_name: String,
}

impl JobExecution {
    pub fn new(job_name: impl Into<String>) -> Self {
        Self { id: None, job_name: job_name.into() }
    }

    pub fn with_id(job_name: impl Into<String>, id: i64) -> Self {
        Self { id: Some(id), job_name: job_name.into() }
    }
}

/// Handle mínimo de una ejecución de step dentro de una ejecución de job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepExecution {
    pub id: Option<i64>,
    pub step_name: String,
    /// Id de la ejecución de job a la que pertenece el step (si ya se asignó).
    pub job_execution_id: Option<i64>,
}

impl StepExecution {
    pub fn new(step_name: impl Into<String>, job_execution: &JobExecution) -> Self {
        Self { id: None, step_name: step_name.into(), job_execution_id: job_execution.id }
    }

    pub fn with_id(step_name: impl Into<String>, id: i64) -> Self {
        Self { id: Some(id), step_name: step_name.into(), job_execution_id: None }
    }
}
