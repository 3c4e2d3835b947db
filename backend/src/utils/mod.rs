pub mod jwt;
pub mod time;

pub use jwt::*;
pub use time::*;
