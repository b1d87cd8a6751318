mod token;
mod pool;
mod path;
mod split;
mod route;
mod error;
pub mod amount;

pub use token::*;
pub use pool::*;
pub use path::*;
pub use split::*;
pub use route::*;
pub use error::*;
