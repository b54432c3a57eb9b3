pub mod market;
pub mod news;
pub mod report;
pub mod summary;
