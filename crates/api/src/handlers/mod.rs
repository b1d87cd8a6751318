mod health;
mod routing;

pub use health::*;
pub use routing::*;
