//! API request handlers.

mod dax;
mod health;
mod query;
mod schema;

pub use dax::*;
pub use health::*;
pub use query::*;
pub use schema::*;
