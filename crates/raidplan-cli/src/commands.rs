use anyhow::{Context, Result};
use raidplan_core::{AggregationOptions, Selection, Tracker};
use tracing::info_span;

use raidplan_cli::config::load_options;
use raidplan_cli::owned::load_owned;
use raidplan_cli::session::{Session, open_tracker};

use crate::cli::{CatalogArgs, MarkersArgs, NeedsArgs, NodeArgs, SessionArgs, StationArgs, StatusArgs};
use crate::summary::{
    print_catalog_summary, print_change, print_markers, print_needs, print_restore_report,
    print_stations, print_statuses,
};

pub fn run_check(args: &CatalogArgs) -> Result<()> {
    let options = load_options(args.config.as_deref())?;
    let tracker = open_tracker(&args.catalog, options)?;
    print_catalog_summary(&tracker);
    Ok(())
}

pub fn run_status(args: &StatusArgs) -> Result<()> {
    let session = open_session(&args.session)?;
    print_restore_report(&session.restore);
    print_statuses(&session.tracker, args.locked);
    print_stations(&session.tracker.station_summaries());
    Ok(())
}

pub fn run_complete(args: &NodeArgs) -> Result<()> {
    let span = info_span!("complete", node = %args.node);
    let _guard = span.enter();
    let session = open_session(&args.session)?;
    let change = session
        .apply(|tracker| tracker.mark_complete(&args.node))
        .with_context(|| format!("complete {}", args.node))?;
    print_change(&session.tracker, &change);
    Ok(())
}

pub fn run_undo(args: &NodeArgs) -> Result<()> {
    let span = info_span!("undo", node = %args.node);
    let _guard = span.enter();
    let session = open_session(&args.session)?;
    let change = session
        .apply(|tracker| tracker.mark_incomplete(&args.node))
        .with_context(|| format!("undo {}", args.node))?;
    print_change(&session.tracker, &change);
    Ok(())
}

pub fn run_station(args: &StationArgs) -> Result<()> {
    let session = open_session(&args.session)?;
    let change = session
        .apply(|tracker| tracker.set_station_level(&args.station, args.level))
        .with_context(|| format!("set {} to level {}", args.station, args.level))?;
    print_change(&session.tracker, &change);
    print_stations(&session.tracker.station_summaries());
    Ok(())
}

pub fn run_needs(args: &NeedsArgs) -> Result<()> {
    let session = open_session(&args.session)?;
    let options = needs_options(&session.tracker, args)?;
    let aggregation = session
        .tracker
        .get_aggregated_requirements(&options)
        .context("aggregate requirements")?;
    print_needs(&session.tracker, &aggregation);
    Ok(())
}

pub fn run_markers(args: &MarkersArgs) -> Result<()> {
    let session = open_session(&args.session)?;
    let active = session.tracker.get_active_markers(&args.map)?;
    print_markers(&session.tracker, &args.map, &active);
    Ok(())
}

fn open_session(args: &SessionArgs) -> Result<Session> {
    let options = load_options(args.catalog.config.as_deref())?;
    Session::open(&args.catalog.catalog, &args.progress, options)
}

/// Configured aggregation defaults with command-line overrides applied.
fn needs_options(tracker: &Tracker, args: &NeedsArgs) -> Result<AggregationOptions> {
    let mut options = tracker.options().aggregation.clone();
    if let Some(depth) = args.look_ahead {
        options.selection = Selection::LookAhead { depth };
    }
    if let Some(scope) = args.scope {
        options.scope = scope.into();
    }
    if let Some(path) = &args.owned {
        options.owned = Some(load_owned(path, tracker.catalog())?);
    }
    Ok(options)
}
