pub mod filter;
pub mod property;
pub mod search;

pub use filter::*;
pub use property::*;
pub use search::*;
