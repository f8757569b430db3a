pub mod error;
pub mod export;
pub mod schema;
pub mod store;
pub mod user;

pub use error::{Result, StoreError};
pub use store::Store;
pub use user::{QuotaSeed, StoreConfig, UserStore, default_base_dir};
