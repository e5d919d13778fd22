//! Configuration options for the tracker.

use serde::{Deserialize, Serialize};

use crate::aggregate::AggregationOptions;
use crate::overlay::OverlayOptions;

/// Options controlling graph construction and the default derived views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TrackerOptions {
    /// Level N of a station implicitly requires level N-1 of the same station.
    ///
    /// Declared prerequisites are kept either way; this only adds the
    /// sequential edge when the catalog leaves it out.
    pub implicit_station_order: bool,

    /// Default aggregation used when the caller does not pass its own.
    pub aggregation: AggregationOptions,

    /// Marker visibility settings for `get_active_markers`.
    pub overlay: OverlayOptions,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            implicit_station_order: true,
            aggregation: AggregationOptions::default(),
            overlay: OverlayOptions::default(),
        }
    }
}

impl TrackerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only use prerequisites the catalog declares.
    pub fn declared_only() -> Self {
        Self {
            implicit_station_order: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_implicit_station_order(mut self, enable: bool) -> Self {
        self.implicit_station_order = enable;
        self
    }

    #[must_use]
    pub fn with_aggregation(mut self, aggregation: AggregationOptions) -> Self {
        self.aggregation = aggregation;
        self
    }

    #[must_use]
    pub fn with_overlay(mut self, overlay: OverlayOptions) -> Self {
        self.overlay = overlay;
        self
    }
}
