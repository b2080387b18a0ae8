//! Loader for journey tables.
//!
//! A journey table is comma-separated text with a header row followed by
//! `source,target,weight,label` rows. The label column may be empty or absent.

use crate::model::{Edge, GraphData, Node};
use crate::utils::{capitalize, check_finite};
use anyhow::{Context, Result, bail};
use std::{collections::HashSet, fs, path::Path};

/// Load a journey table from a file.
pub fn load_journey<P: AsRef<Path>>(file: P) -> Result<GraphData> {
    let file = file.as_ref();
    let contents = fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
    parse_journey(&contents).with_context(|| format!("failed to parse {file:?}"))
}

/// Parse a journey table.
///
/// Nodes are taken from the edge endpoints in order of first appearance and
/// labelled with their capitalized id.
pub fn parse_journey(contents: &str) -> Result<GraphData> {
    let mut rows = contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    if rows.next().is_none() {
        bail!("journey table must have a header row");
    }

    let mut data = GraphData::default();
    let mut seen = HashSet::new();
    for (i_line, line) in rows {
        let edge = parse_row(line).with_context(|| format!("invalid row on line {}", i_line + 1))?;
        for id in [&edge.source, &edge.target] {
            if seen.insert(id.clone()) {
                data.nodes.push(Node::new(id.as_str(), capitalize(id)));
            }
        }
        data.edges.push(edge);
    }

    Ok(data)
}

fn parse_row(line: &str) -> Result<Edge> {
    let values: Vec<_> = line.split(',').map(str::trim).collect();
    let n_cols = values.len();
    if !(3..=4).contains(&n_cols) {
        bail!("row must have 3 or 4 columns, but has {n_cols}");
    }

    let source = values[0];
    let target = values[1];
    if source.is_empty() || target.is_empty() {
        bail!("source and target must not be empty");
    }

    let weight: f64 = values[2]
        .parse()
        .with_context(|| format!("failed to parse weight {:?}", values[2]))?;
    check_finite(weight).context("invalid weight")?;

    let mut edge = Edge::new(source, target, weight);
    if let Some(&label) = values.get(3).filter(|label| !label.is_empty()) {
        edge = edge.with_label(label);
    }
    Ok(edge)
}
