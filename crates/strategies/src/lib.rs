mod path_finder;
mod route_search;
mod split_router;
mod session;

#[cfg(test)]
mod test_support;

pub use path_finder::*;
pub use route_search::*;
pub use split_router::*;
pub use session::*;
