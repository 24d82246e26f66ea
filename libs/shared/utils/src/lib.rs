pub mod extractor;
pub mod jwt;
pub mod pagination;
pub mod test_utils;
pub mod time;

pub use pagination::{Page, PageWindow};
