use crate::errors::IntrospectionError;
use crate::introspection::schema::IntrospectionSchema;
use serde_json::Value;
use std::time::{Duration, Instant};

/// An immutable copy of an introspected schema, as fetched at one point in time
#[derive(Debug)]
pub struct SchemaSnapshot {
    raw: Value,
    schema: IntrospectionSchema,
    fetched_at: Instant,
    include_deprecated: bool,
}

impl SchemaSnapshot {
    /// Build a snapshot from the `__schema` object of an introspection response
    pub fn new(raw: Value, include_deprecated: bool) -> Result<Self, IntrospectionError> {
        let schema = serde_json::from_value(raw.clone())?;
        Ok(Self {
            raw,
            schema,
            fetched_at: Instant::now(),
            include_deprecated,
        })
    }

    /// Build a snapshot from a full GraphQL response, `{"data": {"__schema": ...}}`
    pub fn from_response(
        mut response: Value,
        include_deprecated: bool,
    ) -> Result<Self, IntrospectionError> {
        match response.pointer_mut("/data/__schema").map(Value::take) {
            Some(raw) if raw.is_object() => Self::new(raw, include_deprecated),
            _ => Err(IntrospectionError::MissingSchema),
        }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn schema(&self) -> &IntrospectionSchema {
        &self.schema
    }

    pub fn include_deprecated(&self) -> bool {
        self.include_deprecated
    }

    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.age() >= ttl
    }
}
