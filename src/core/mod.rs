pub mod actions;
pub mod capabilities;
pub mod config;
pub mod console;
pub mod convert;
pub mod directive;
pub mod dispatcher;
pub mod llm;
pub mod prompts;
pub mod store;
pub mod workspace;

pub use actions::*;
pub use capabilities::*;
pub use config::*;
pub use console::*;
pub use convert::*;
pub use directive::*;
pub use dispatcher::*;
pub use llm::*;
pub use prompts::*;
pub use store::*;
pub use workspace::*;
