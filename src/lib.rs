pub mod clerk;
pub mod config;
pub mod d1;
pub mod error;
pub mod models;
pub mod report;

pub use config::Config;
pub use error::{AppError, AppResult};
