pub mod cursor;
pub mod eval;
pub mod parse;
pub mod types;

pub use cursor::Cursor;
pub use types::{DeleteResult, InsertResult, Query, UpdateResult, UpdateSpec};
