//! Request handlers.

pub mod articles;
pub mod health;
pub mod status;
pub mod summary;

pub use articles::*;
pub use health::*;
pub use status::*;
pub use summary::*;
