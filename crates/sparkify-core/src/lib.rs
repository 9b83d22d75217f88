pub mod config;
pub mod db;
pub mod diagnostics;
pub mod error;
pub mod object_store;
pub mod pipeline;
pub mod preview;
pub mod schema;
pub mod staging;
pub mod statements;
pub mod transforms;

pub use diagnostics::get_load_errors;
pub use schema::{create_table_queries, drop_table_queries};
pub use staging::{copy_table_queries, CopyConfig};
pub use transforms::{insert_table_queries, TransformOptions};
