pub mod db;
pub mod models;
mod news;
mod stocks;
mod summaries;
mod users;

pub use db::StoreDb;
pub use models::*;
