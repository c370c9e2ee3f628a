//! Esquema Diesel (declarado a mano). Reemplazable con `diesel print-schema`.

diesel::table! {
    batch_execution_context (execution_id, context_type) {
        execution_id -> BigInt,
        context_type -> Text,
        entries -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}
