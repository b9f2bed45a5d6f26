mod api;
mod database;

pub use api::*;
pub use database::*;
