pub mod handlers;
pub mod models;
pub mod plugin;
pub mod upload;

pub use models::*;
pub use plugin::BlogPlugin;
