pub mod confidence;
pub mod indicators;
pub mod labels;
pub mod market;
pub mod prescreen;
pub mod rules;
pub mod scoring;
pub mod screens;
pub mod sentiment;
pub mod technicals;


pub use confidence::*;
pub use indicators::*;
pub use labels::*;
pub use market::*;
pub use prescreen::*;
pub use rules::*;
pub use scoring::*;
pub use screens::*;
pub use sentiment::*;
pub use technicals::*;
