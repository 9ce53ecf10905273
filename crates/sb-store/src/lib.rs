pub mod data_dir;
pub mod error;
pub mod identity;
pub mod json_bridge;
pub mod schema;
pub mod settings;
pub mod store;

pub use data_dir::{DEFAULT_PROFILE, DataDir, default_base_dir, sanitize_name};
pub use error::{Result, StoreError};
pub use identity::LocalIdentity;
pub use settings::Settings;
pub use store::Store;
