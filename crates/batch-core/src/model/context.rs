//! Mapa tipado mutable de estado de una ejecución (checkpoint/resume).

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::ContextValue;
use crate::errors::ContextError;

/// Bolsa clave/valor tipada adjunta a una ejecución de job o step.
///
/// Igualdad estructural: mismo conjunto de claves y valores iguales,
/// independiente del orden de inserción. El flag `dirty` no participa en la
/// igualdad; lo consultan los callers para decidir si re-persistir, nunca el
/// store.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    entries: HashMap<String, ContextValue>,
    dirty: bool,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserta o sobreescribe (en silencio) el valor bajo `key`.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        self.entries.insert(key.into(), value.into());
        self.dirty = true;
    }

    pub fn put_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.put(key, ContextValue::String(value.into()));
    }

    pub fn put_bool(&mut self, key: impl Into<String>, value: bool) {
        self.put(key, ContextValue::Bool(value));
    }

    pub fn put_int(&mut self, key: impl Into<String>, value: i32) {
        self.put(key, ContextValue::Int(value));
    }

    pub fn put_long(&mut self, key: impl Into<String>, value: i64) {
        self.put(key, ContextValue::Long(value));
    }

    pub fn put_double(&mut self, key: impl Into<String>, value: f64) {
        self.put(key, ContextValue::Double(value));
    }

    /// Guarda un objeto serializable opaco vía el fallback JSON genérico.
    pub fn put_object<T: Serialize>(&mut self, key: impl Into<String>, value: &T) -> Result<(), ContextError> {
        let json = serde_json::to_value(value).map_err(|e| ContextError::Serialization(e.to_string()))?;
        self.put(key, ContextValue::Object(json));
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.entries.get(key)
    }

    fn get_required(&self, key: &str) -> Result<&ContextValue, ContextError> {
        self.entries.get(key).ok_or_else(|| ContextError::KeyNotFound(key.to_string()))
    }

    pub fn get_string(&self, key: &str) -> Result<&str, ContextError> {
        match self.get_required(key)? {
            ContextValue::String(s) => Ok(s),
            other => Err(mismatch(key, "string", other)),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, ContextError> {
        match self.get_required(key)? {
            ContextValue::Bool(b) => Ok(*b),
            other => Err(mismatch(key, "bool", other)),
        }
    }

    pub fn get_int(&self, key: &str) -> Result<i32, ContextError> {
        match self.get_required(key)? {
            ContextValue::Int(v) => Ok(*v),
            other => Err(mismatch(key, "int", other)),
        }
    }

    pub fn get_long(&self, key: &str) -> Result<i64, ContextError> {
        match self.get_required(key)? {
            ContextValue::Long(v) => Ok(*v),
            other => Err(mismatch(key, "long", other)),
        }
    }

    pub fn get_double(&self, key: &str) -> Result<f64, ContextError> {
        match self.get_required(key)? {
            ContextValue::Double(v) => Ok(*v),
            other => Err(mismatch(key, "double", other)),
        }
    }

    /// Reconstruye un objeto opaco guardado con `put_object`.
    pub fn get_object<T: DeserializeOwned>(&self, key: &str) -> Result<T, ContextError> {
        match self.get_required(key)? {
            ContextValue::Object(json) => {
                serde_json::from_value(json.clone()).map_err(|e| ContextError::Serialization(e.to_string()))
            }
            other => Err(mismatch(key, "object", other)),
        }
    }

    // Variantes con default: ausencia devuelve el default del caller, pero un
    // valor presente de tipo incorrecto sigue siendo TypeMismatch.

    pub fn get_string_or<'a>(&'a self, key: &str, default: &'a str) -> Result<&'a str, ContextError> {
        match self.get_string(key) {
            Err(ContextError::KeyNotFound(_)) => Ok(default),
            other => other,
        }
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> Result<bool, ContextError> {
        match self.get_bool(key) {
            Err(ContextError::KeyNotFound(_)) => Ok(default),
            other => other,
        }
    }

    pub fn get_int_or(&self, key: &str, default: i32) -> Result<i32, ContextError> {
        match self.get_int(key) {
            Err(ContextError::KeyNotFound(_)) => Ok(default),
            other => other,
        }
    }

    pub fn get_long_or(&self, key: &str, default: i64) -> Result<i64, ContextError> {
        match self.get_long(key) {
            Err(ContextError::KeyNotFound(_)) => Ok(default),
            other => other,
        }
    }

    pub fn get_double_or(&self, key: &str, default: f64) -> Result<f64, ContextError> {
        match self.get_double(key) {
            Err(ContextError::KeyNotFound(_)) => Ok(default),
            other => other,
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<ContextValue> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContextValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// True si hubo mutaciones desde la construcción o el último
    /// `clear_dirty`.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

fn mismatch(key: &str, expected: &'static str, found: &ContextValue) -> ContextError {
    ContextError::TypeMismatch { key: key.to_string(), expected, found: found.type_name() }
}

impl PartialEq for ExecutionContext {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Into<String>, V: Into<ContextValue>> FromIterator<(K, V)> for ExecutionContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = Self::new();
        for (k, v) in iter {
            ctx.put(k, v);
        }
        ctx.dirty = false;
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[test]
    fn typed_getters_enforce_the_stored_type() {
        let mut ctx = ExecutionContext::new();
        ctx.put_long("n", 7);
        assert_eq!(ctx.get_long("n"), Ok(7));
        // A long is not an int, even for the same numeric value
        assert_eq!(ctx.get_int("n"),
                   Err(ContextError::TypeMismatch { key: "n".into(), expected: "int", found: "long" }));
    }

    #[test]
    fn absent_key_is_key_not_found() {
        let ctx = ExecutionContext::new();
        assert_eq!(ctx.get_string("missing"), Err(ContextError::KeyNotFound("missing".into())));
    }

    #[test]
    fn defaults_apply_on_absence_only() {
        let mut ctx = ExecutionContext::new();
        ctx.put_string("s", "value");
        assert_eq!(ctx.get_long_or("missing", 9), Ok(9));
        // Present-but-wrong-type still fails
        assert!(matches!(ctx.get_long_or("s", 9), Err(ContextError::TypeMismatch { .. })));
    }

    #[test]
    fn put_overwrites_silently() {
        let mut ctx = ExecutionContext::new();
        ctx.put_string("k", "first");
        ctx.put_long("k", 2);
        assert_eq!(ctx.get_long("k"), Ok(2));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn equality_is_structural_and_order_independent() {
        let mut a = ExecutionContext::new();
        a.put_string("key", "value");
        a.put_long("longKey", 7);
        let mut b = ExecutionContext::new();
        b.put_long("longKey", 7);
        b.put_string("key", "value");
        assert_eq!(a, b);

        b.put_long("longKey", 8);
        assert_ne!(a, b);
    }

    #[test]
    fn dirty_flag_tracks_mutation_but_not_equality() {
        let mut a = ExecutionContext::new();
        assert!(!a.is_dirty());
        a.put_string("key", "value");
        assert!(a.is_dirty());
        a.clear_dirty();
        assert!(!a.is_dirty());
        a.remove("key");
        assert!(a.is_dirty());
        // Removing an absent key is not a mutation
        a.clear_dirty();
        a.remove("key");
        assert!(!a.is_dirty());

        let clean: ExecutionContext = [("key", "value")].into_iter().collect();
        let mut dirtied = ExecutionContext::new();
        dirtied.put_string("key", "value");
        assert_eq!(clean, dirtied);
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Checkpoint {
        offset: u64,
        file: String,
    }

    #[test]
    fn opaque_objects_roundtrip_by_equality() {
        let mut ctx = ExecutionContext::new();
        let cp = Checkpoint { offset: 128, file: "part-0001.csv".into() };
        ctx.put_object("checkpoint", &cp).unwrap();
        let restored: Checkpoint = ctx.get_object("checkpoint").unwrap();
        assert_eq!(restored, cp);
    }

    #[test]
    fn get_object_on_scalar_is_type_mismatch() {
        let mut ctx = ExecutionContext::new();
        ctx.put_long("n", 7);
        let err = ctx.get_object::<Checkpoint>("n").unwrap_err();
        assert!(matches!(err, ContextError::TypeMismatch { .. }));
    }
}
