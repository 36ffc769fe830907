pub mod api;
mod app;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod store;
mod utils;


pub use api::Mode;
pub use app::App;
pub use config::Config;
pub use error::Error;
pub use error::Result;
