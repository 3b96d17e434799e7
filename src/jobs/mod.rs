//! Background jobs.
//!
//! - **Scheduled identity sync**: runs a full sync for every organization on
//!   a fixed interval.
//!
//! ```toml
//! [identity_sync.schedule]
//! enabled = true
//! interval_secs = 3600
//! ```

mod identity_sync;

pub use identity_sync::{SyncPassResult, run_sync_pass, start_identity_sync_worker};
