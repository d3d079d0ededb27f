pub mod errors;
mod graphql;
pub mod introspection;
pub mod json_schema;
pub mod operations;
pub mod safety;
pub mod server;
pub mod session;
