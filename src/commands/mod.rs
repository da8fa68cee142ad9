pub mod capability;
pub mod file;
pub mod help;
pub mod mode;
pub mod model;
pub mod repl;
pub mod server;
pub mod smtp;
pub mod work;

pub use capability::*;
pub use file::*;
pub use help::*;
pub use mode::*;
pub use model::*;
pub use repl::*;
pub use server::*;
pub use smtp::*;
pub use work::*;
