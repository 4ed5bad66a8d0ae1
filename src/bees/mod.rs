pub mod directory;
pub mod parser;
pub mod types;

pub use directory::{StatusDir, StatusFile};
pub use parser::parse_status;
pub use types::{Point, ProgressRow, StatusRecord};
