mod api;
mod config;
mod database;
mod errors;
mod middleware;
mod models;
mod permissions;
mod startup;
mod telemetry;
mod utils;

pub use api::*;
pub use config::*;
pub use database::*;
pub use errors::*;
pub use middleware::*;
pub use models::*;
pub use permissions::*;
pub use startup::*;
pub use telemetry::*;
pub use utils::*;
