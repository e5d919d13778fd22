use std::collections::BTreeSet;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use raidplan_core::{
    Aggregation, DropReason, ProgressChange, RestoreReport, StationSummary, Tracker,
};
use raidplan_model::{DerivedStatus, MapId, MarkerId, NodeId};

pub fn print_catalog_summary(tracker: &Tracker) {
    let catalog = tracker.catalog();
    let graph = tracker.graph();
    let mut table = Table::new();
    table.set_header(vec![header_cell("Table"), header_cell("Entries")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    let rows = [
        ("Items", catalog.items().count()),
        ("Quests", catalog.quests().count()),
        ("Hideout stations", catalog.stations().count()),
        ("Hideout levels", catalog.levels().count()),
        ("Maps", catalog.maps().count()),
        ("Markers", catalog.markers().count()),
    ];
    for (label, count) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(count)]);
    }
    table.add_row(vec![
        Cell::new("Dependency layers")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(graph.layers().len()).add_attribute(Attribute::Bold),
    ]);
    println!("Catalog OK");
    println!("Fingerprint: {}", catalog.fingerprint());
    println!("{table}");
}

pub fn print_restore_report(report: &RestoreReport) {
    if report.catalog_changed {
        eprintln!("note: progress was saved against a different catalog");
    }
    for dropped in &report.dropped {
        let reason = match dropped.reason {
            DropReason::UnknownId => "no longer in the catalog",
            DropReason::PrerequisitesMissing => "prerequisites not completed",
        };
        eprintln!("note: dropped '{}' from saved progress ({reason})", dropped.id);
    }
}

pub fn print_statuses(tracker: &Tracker, include_locked: bool) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Node"),
        header_cell("Name"),
        header_cell("Status"),
        header_cell("Waiting on"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Center);
    let mut counts = [0usize; 3];
    for (node, status) in tracker.statuses() {
        counts[status_rank(status)] += 1;
        if status == DerivedStatus::Locked && !include_locked {
            continue;
        }
        let waiting = if status == DerivedStatus::Locked {
            let missing = tracker.missing_prerequisites(&node).unwrap_or_default();
            Cell::new(join_nodes(&missing))
        } else {
            dim_cell("-")
        };
        table.add_row(vec![
            node_cell(&node),
            Cell::new(node_name(tracker, &node)),
            status_cell(status),
            waiting,
        ]);
    }
    println!("{table}");
    println!(
        "{} available, {} completed, {} locked",
        counts[1], counts[2], counts[0]
    );
}

pub fn print_stations(stations: &[StationSummary]) {
    if stations.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Station"),
        header_cell("Level"),
        header_cell("Next"),
        header_cell("Next status"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Center);
    for station in stations {
        let level = format!("{}/{}", station.current_level, station.max_level);
        let level_cell = if station.current_level == station.max_level {
            Cell::new(level).fg(Color::Green)
        } else {
            Cell::new(level)
        };
        table.add_row(vec![
            Cell::new(&station.name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            level_cell,
            station
                .next_level
                .as_ref()
                .map_or_else(|| dim_cell("-"), Cell::new),
            station
                .next_status
                .map_or_else(|| dim_cell("-"), status_cell),
        ]);
    }
    println!();
    println!("{table}");
}

pub fn print_change(tracker: &Tracker, change: &ProgressChange) {
    if change.is_empty() {
        println!("No change.");
        return;
    }
    for node in &change.completed {
        println!("completed  {node}  {}", node_name(tracker, node));
    }
    for node in &change.retracted {
        println!("retracted  {node}  {}", node_name(tracker, node));
    }
    for node in change.affected(tracker.graph()) {
        if change.completed.contains(&node) || change.retracted.contains(&node) {
            continue;
        }
        if let Ok(status) = tracker.get_status(&node) {
            println!("now {:<9} {node}  {}", status.as_str(), node_name(tracker, &node));
        }
    }
}

pub fn print_needs(tracker: &Tracker, aggregation: &Aggregation) {
    if aggregation.is_empty() {
        println!(
            "Nothing to collect for {} selected node(s).",
            aggregation.nodes.len()
        );
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Item"),
        header_cell("Required"),
        header_cell("Owned"),
        header_cell("Outstanding"),
        header_cell("FIR"),
        header_cell("Provided"),
        header_cell("Needed for"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Center);
    align_column(&mut table, 5, CellAlignment::Center);
    for entry in aggregation.iter() {
        let outstanding = if entry.outstanding_quantity == 0 {
            Cell::new(0).fg(Color::Green)
        } else {
            Cell::new(entry.outstanding_quantity)
                .fg(Color::Yellow)
                .add_attribute(Attribute::Bold)
        };
        let sources: Vec<String> = entry
            .contributing_nodes()
            .iter()
            .map(|node| node_name(tracker, node))
            .collect();
        table.add_row(vec![
            Cell::new(&entry.item_name),
            Cell::new(entry.required_quantity),
            entry
                .owned_quantity
                .map_or_else(|| dim_cell("-"), Cell::new),
            outstanding,
            if entry.found_in_raid {
                Cell::new("✓").fg(Color::Red).add_attribute(Attribute::Bold)
            } else {
                dim_cell("-")
            },
            if entry.provided {
                Cell::new("on start").fg(Color::Cyan)
            } else {
                dim_cell("-")
            },
            Cell::new(sources.join(", ")),
        ]);
    }
    println!("{table}");
    println!(
        "{} item(s), {} outstanding across {} node(s)",
        aggregation.len(),
        aggregation.total_outstanding(),
        aggregation.nodes.len()
    );
}

pub fn print_markers(tracker: &Tracker, map: &MapId, active: &BTreeSet<MarkerId>) {
    let catalog = tracker.catalog();
    let map_name = catalog.map(map).map_or(map.as_str(), |m| m.name.as_str());
    if active.is_empty() {
        println!("No active markers on {map_name}.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Marker"),
        header_cell("Position"),
        header_cell("Floor"),
        header_cell("Objective"),
    ]);
    apply_table_style(&mut table);
    for marker in active.iter().filter_map(|id| catalog.marker(id)) {
        let c = &marker.coordinate;
        let position = match c.z {
            Some(z) => format!("{:.1}, {:.1}, {:.1}", c.x, c.y, z),
            None => format!("{:.1}, {:.1}", c.x, c.y),
        };
        let objective = match &marker.objective {
            Some(objective) => {
                let quest = NodeId::quest(&objective.quest_id);
                Cell::new(format!(
                    "{} #{}",
                    node_name(tracker, &quest),
                    objective.objective_index + 1
                ))
            }
            None => dim_cell("landmark"),
        };
        table.add_row(vec![
            Cell::new(&marker.id),
            Cell::new(position),
            marker
                .floor
                .as_deref()
                .map_or_else(|| dim_cell("-"), Cell::new),
            objective,
        ]);
    }
    println!("{map_name}");
    println!("{table}");
}

fn node_name(tracker: &Tracker, node: &NodeId) -> String {
    tracker
        .catalog()
        .node_name(node)
        .unwrap_or_else(|| node.to_string())
}

fn join_nodes(nodes: &[NodeId]) -> String {
    nodes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn status_rank(status: DerivedStatus) -> usize {
    match status {
        DerivedStatus::Locked => 0,
        DerivedStatus::Available => 1,
        DerivedStatus::Completed => 2,
    }
}

fn status_cell(status: DerivedStatus) -> Cell {
    match status {
        DerivedStatus::Completed => Cell::new("DONE").fg(Color::Green),
        DerivedStatus::Available => Cell::new("AVAILABLE")
            .fg(Color::Yellow)
            .add_attribute(Attribute::Bold),
        DerivedStatus::Locked => dim_cell("LOCKED"),
    }
}

fn node_cell(node: &NodeId) -> Cell {
    if node.is_quest() {
        Cell::new(node).fg(Color::Blue)
    } else {
        Cell::new(node).fg(Color::Magenta)
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
