// src/dag/validate.rs

//! Structural checks on step definitions.
//!
//! - [`build_adjacency`] enforces unique ids and resolves every dependency
//!   name to a step index. Both construction and snapshot restore go through
//!   it.
//! - [`find_cycle`] is an iterative three-color DFS over the resolved
//!   adjacency. Only construction runs it; restored snapshots are trusted to
//!   come from an already validated graph.

use std::collections::HashMap;

use tracing::debug;

use crate::dag::step::StepDef;
use crate::errors::ConstructionError;
use crate::types::StepName;

/// Step ids resolved to positions in declaration order.
#[derive(Debug, Clone)]
pub(crate) struct Adjacency {
    pub(crate) index: HashMap<StepName, usize>,
    /// `deps[i]` holds the indices step `i` waits on, without repeats.
    pub(crate) deps: Vec<Vec<usize>>,
}

/// Reason [`build_adjacency`] refused its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum IntegrityViolation {
    DuplicateId(StepName),
    UnknownReference { step: StepName, dependency: StepName },
}

/// Index the given `(id, depends_on)` entries.
///
/// Duplicate ids are checked over the whole input before any dependency is
/// resolved, so the reported violation does not depend on where the bad
/// reference sits.
pub(crate) fn build_adjacency(
    entries: &[(&str, &[StepName])],
) -> Result<Adjacency, IntegrityViolation> {
    let mut index: HashMap<StepName, usize> = HashMap::with_capacity(entries.len());

    for (pos, (id, _)) in entries.iter().enumerate() {
        if index.insert(id.to_string(), pos).is_some() {
            return Err(IntegrityViolation::DuplicateId(id.to_string()));
        }
    }

    let mut deps = Vec::with_capacity(entries.len());
    for (id, depends_on) in entries {
        let mut resolved: Vec<usize> = Vec::with_capacity(depends_on.len());
        for dep in depends_on.iter() {
            let Some(&dep_idx) = index.get(dep) else {
                return Err(IntegrityViolation::UnknownReference {
                    step: id.to_string(),
                    dependency: dep.clone(),
                });
            };
            if !resolved.contains(&dep_idx) {
                resolved.push(dep_idx);
            }
        }
        deps.push(resolved);
    }

    Ok(Adjacency { index, deps })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Finished,
}

/// Three-color depth-first search for a cycle.
///
/// Roots are taken in declaration order and edges in `deps` order, so the
/// result is deterministic for a given input. Returns the in-progress node a
/// back edge points to, i.e. a node on the cycle.
pub(crate) fn find_cycle(deps: &[Vec<usize>]) -> Option<usize> {
    let mut marks = vec![Mark::Unvisited; deps.len()];
    // (node, position of the next edge to follow)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..deps.len() {
        if marks[root] != Mark::Unvisited {
            continue;
        }

        marks[root] = Mark::InProgress;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let (node, next) = *frame;

            match deps[node].get(next) {
                Some(&dep) => {
                    frame.1 += 1;
                    match marks[dep] {
                        Mark::Unvisited => {
                            marks[dep] = Mark::InProgress;
                            stack.push((dep, 0));
                        }
                        Mark::InProgress => return Some(dep),
                        Mark::Finished => {}
                    }
                }
                None => {
                    marks[node] = Mark::Finished;
                    stack.pop();
                }
            }
        }
    }

    None
}

/// Run every construction check and return the resolved adjacency.
pub(crate) fn check_defs(defs: &[StepDef]) -> Result<Adjacency, ConstructionError> {
    let entries: Vec<(&str, &[StepName])> = defs
        .iter()
        .map(|d| (d.id.as_str(), d.depends_on.as_slice()))
        .collect();

    let adjacency = build_adjacency(&entries).map_err(|violation| match violation {
        IntegrityViolation::DuplicateId(id) => ConstructionError::DuplicateId(id),
        IntegrityViolation::UnknownReference { step, dependency } => {
            ConstructionError::UnknownDependency { step, dependency }
        }
    })?;

    if let Some(node) = find_cycle(&adjacency.deps) {
        let step = defs[node].id.clone();
        debug!(step = %step, "back edge found while validating step graph");
        return Err(ConstructionError::CycleDetected(step));
    }

    Ok(adjacency)
}

/// Check that `defs` would form a valid graph, without building one.
pub fn validate_defs(defs: &[StepDef]) -> Result<(), ConstructionError> {
    check_defs(defs).map(|_| ())
}
