pub mod config;
pub mod db;
pub mod generation;
pub mod http_error;
pub mod kernel;
pub mod media;
pub mod plugins;
pub mod state;
pub mod store;

pub use crate::db::*;
pub use crate::kernel::*;
pub use crate::state::AppState;
