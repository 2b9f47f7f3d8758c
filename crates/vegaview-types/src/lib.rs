pub mod error;
pub mod filter;
pub mod message;
pub mod parser;
pub mod time;

pub use error::{Error, Result};
pub use filter::*;
pub use message::*;
pub use parser::*;
pub use time::*;
