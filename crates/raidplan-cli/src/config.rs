//! Tracker options from an optional TOML file.
//!
//! ```toml
//! implicit-station-order = true
//!
//! [aggregation]
//! scope = "quests"
//! selection = { kind = "look-ahead", depth = 2 }
//!
//! [overlay]
//! hidden = ["scav-stash-3"]
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use raidplan_core::TrackerOptions;

/// Read options from `path`, or return defaults when no path is given.
pub fn load_options(path: Option<&Path>) -> Result<TrackerOptions> {
    let Some(path) = path else {
        return Ok(TrackerOptions::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let options = parse_options(&content)
        .with_context(|| format!("parse config {}", path.display()))?;
    tracing::info!("loaded options from {}", path.display());
    Ok(options)
}

pub fn parse_options(content: &str) -> Result<TrackerOptions> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use raidplan_core::{NodeScope, Selection};

    #[test]
    fn empty_file_is_default() {
        assert_eq!(parse_options("").unwrap(), TrackerOptions::default());
    }

    #[test]
    fn reads_nested_sections() {
        let options = parse_options(
            r#"
            implicit-station-order = false

            [aggregation]
            scope = "hideout"
            selection = { kind = "look-ahead", depth = 3 }

            [overlay]
            hidden = ["gas-station"]
            "#,
        )
        .unwrap();
        assert!(!options.implicit_station_order);
        assert_eq!(options.aggregation.scope, NodeScope::Hideout);
        assert_eq!(options.aggregation.selection, Selection::LookAhead { depth: 3 });
        assert_eq!(options.overlay.hidden.len(), 1);
    }

    #[test]
    fn unknown_scope_is_rejected() {
        assert!(parse_options("[aggregation]\nscope = \"raids\"").is_err());
    }
}
