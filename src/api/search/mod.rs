pub mod admin;
pub mod query;
pub mod types;

pub use admin::*;
pub use query::*;
