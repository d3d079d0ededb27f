//! Shared fixtures for tests that need an introspected schema

use crate::introspection::snapshot::SchemaSnapshot;

pub(crate) const COUNTRIES_INTROSPECTION: &str =
    include_str!("../../tests/fixtures/countries_introspection.json");

pub(crate) fn countries_sdl() -> &'static str {
    include_str!("../../tests/fixtures/countries.graphql")
}

pub(crate) fn countries_snapshot() -> SchemaSnapshot {
    SchemaSnapshot::from_response(serde_json::from_str(COUNTRIES_INTROSPECTION).unwrap(), false)
        .unwrap()
}
