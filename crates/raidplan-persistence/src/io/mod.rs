//! Progress file I/O: atomic saves and validated loads.

mod load;
mod save;

pub use load::{load_progress, load_progress_or_default};
pub use save::save_progress;
