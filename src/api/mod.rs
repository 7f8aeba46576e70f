pub mod extract;

pub use extract::{ApiJson, ApiQuery, IdPath};
