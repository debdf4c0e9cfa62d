pub mod backend;
pub mod error;
pub mod path;
pub mod result;

pub use backend::*;
pub use error::*;
pub use path::{Path, Segment};
pub use result::*;
