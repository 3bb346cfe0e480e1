//! Request handlers.

pub mod guest;
pub mod health;
pub mod jobs;

pub use guest::*;
pub use health::*;
pub use jobs::*;
