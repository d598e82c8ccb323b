pub mod context;
pub mod session;
pub mod token;
pub mod utils;
