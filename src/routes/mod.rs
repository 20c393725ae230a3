pub mod posts;
pub mod segments;
