//! Progress files for raidplan.
//!
//! Progress is stored as a small JSON document tagged with a schema name and
//! version, so files written against an older catalog can still be
//! reconciled on load:
//!
//! ```text
//! {
//!   "schema": "raidplan.progress",
//!   "schemaVersion": 1,
//!   "catalogFingerprint": "<sha-256 of the catalog>",
//!   "savedAt": "2025-01-01T12:00:00Z",
//!   "completedQuestIds": ["..."],
//!   "completedHideoutLevelIds": ["..."]
//! }
//! ```
//!
//! Saves go through a temp file and a rename. [`JsonFileSink`] plugs the
//! same save into a progress store as its write-through target.

mod error;
mod io;
mod sink;

pub use error::{PersistenceError, Result};
pub use io::{load_progress, load_progress_or_default, save_progress};
pub use sink::JsonFileSink;
