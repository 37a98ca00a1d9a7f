//! Database models split into domain-specific modules.

pub mod blog;
pub mod common;
pub mod message;
pub mod order;
pub mod pricing;
pub mod project;
pub mod settings;

pub use blog::*;
pub use common::*;
pub use message::*;
pub use order::*;
pub use pricing::*;
pub use project::*;
pub use settings::*;
