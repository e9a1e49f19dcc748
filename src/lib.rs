pub mod fetch;
pub mod ingest;
pub mod pg;
pub mod schema;
