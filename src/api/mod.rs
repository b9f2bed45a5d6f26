mod extract;
mod permissions;

pub use extract::*;
pub use permissions::*;
