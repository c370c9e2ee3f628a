//! Valor tipado de una entrada de contexto.
//!
//! Unión etiquetada explícita en lugar de inspección de tipos en runtime: el
//! discriminante viaja con el valor en la forma serializada
//! (`{"type": "long", "value": 7}`), de modo que `Int` y `Long` nunca
//! colapsan entre sí al pasar por JSONB aunque JSON no distinga anchos de
//! entero.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ContextValue {
    String(String),
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    /// Fallback genérico para objetos serializables opacos. Round-trip por
    /// igualdad de la representación JSON, no por identidad de bytes.
    Object(Value),
}

impl ContextValue {
    /// Nombre estable del discriminante, para mensajes de TypeMismatch.
    pub fn type_name(&self) -> &'static str {
        match self {
            ContextValue::String(_) => "string",
            ContextValue::Bool(_) => "bool",
            ContextValue::Int(_) => "int",
            ContextValue::Long(_) => "long",
            ContextValue::Double(_) => "double",
            ContextValue::Object(_) => "object",
        }
    }
}

impl From<&str> for ContextValue {
    fn from(v: &str) -> Self {
        ContextValue::String(v.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(v: String) -> Self {
        ContextValue::String(v)
    }
}

impl From<bool> for ContextValue {
    fn from(v: bool) -> Self {
        ContextValue::Bool(v)
    }
}

impl From<i32> for ContextValue {
    fn from(v: i32) -> Self {
        ContextValue::Int(v)
    }
}

impl From<i64> for ContextValue {
    fn from(v: i64) -> Self {
        ContextValue::Long(v)
    }
}

impl From<f64> for ContextValue {
    fn from(v: f64) -> Self {
        ContextValue::Double(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tagged_representation_keeps_integer_width() {
        let int = serde_json::to_value(ContextValue::Int(7)).unwrap();
        let long = serde_json::to_value(ContextValue::Long(7)).unwrap();
        assert_eq!(int, json!({"type": "int", "value": 7}));
        assert_eq!(long, json!({"type": "long", "value": 7}));
        assert_ne!(int, long);

        // Y de vuelta cada uno restaura su variante original.
        assert_eq!(serde_json::from_value::<ContextValue>(int).unwrap(), ContextValue::Int(7));
        assert_eq!(serde_json::from_value::<ContextValue>(long).unwrap(), ContextValue::Long(7));
    }

    #[test]
    fn from_impls_pick_the_expected_variant() {
        assert_eq!(ContextValue::from("value"), ContextValue::String("value".into()));
        assert_eq!(ContextValue::from(7i32), ContextValue::Int(7));
        assert_eq!(ContextValue::from(7i64), ContextValue::Long(7));
        assert_eq!(ContextValue::from(0.5), ContextValue::Double(0.5));
        assert_eq!(ContextValue::from(true), ContextValue::Bool(true));
    }
}
