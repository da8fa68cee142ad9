pub mod config;
pub mod message;
pub mod store;
pub mod workspace;

pub use config::*;
pub use message::*;
pub use store::*;
pub use workspace::*;
