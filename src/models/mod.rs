mod external;
mod group;
mod identity_sync;
mod identity_sync_config;
mod identity_sync_mapping;
mod organization;
mod project;
mod sync_log;
mod user;
mod validators;

pub use external::*;
pub use group::*;
pub use identity_sync::*;
pub use identity_sync_config::*;
pub use identity_sync_mapping::*;
pub use organization::*;
pub use project::*;
pub use sync_log::*;
pub use user::*;
