pub mod handlers;
pub mod models;
pub mod plugin;

pub use models::AdminAccount;
pub use plugin::AdminPlugin;
