mod token_resolver;
mod submitter;

pub use token_resolver::*;
pub use submitter::*;
