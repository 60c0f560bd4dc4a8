mod fuzzy;
mod timestamp;
mod types;

pub use fuzzy::*;
pub use timestamp::*;
pub use types::*;
