//! Bounded k-hop subgraph expansion.

use std::collections::{BTreeSet, HashSet};

use crate::graph::{Triple, TripleStore};

/// Grow `seeds` by `hops` rounds of neighbor discovery.
///
/// Each round walks a sorted snapshot of the working set; for every triple both
/// endpoints are visited in alphabetical order and at most the first
/// `max_neighbors_per_hop` (alphabetical) neighbors of each are considered.
/// An unvisited neighbor contributes the edges between it and the endpoint in
/// either direction, then becomes visited. Discoveries are merged only after the
/// round ends, so a node found in hop N expands from hop N+1.
///
/// Returns the working set sorted by `(head, relation, tail)`, without duplicates.
pub fn expand_subgraph<P>(
    store: &TripleStore<P>,
    seeds: &[Triple],
    hops: usize,
    max_neighbors_per_hop: usize,
) -> Vec<Triple> {
    let mut working: BTreeSet<Triple> = seeds.iter().cloned().collect();
    let mut visited: HashSet<String> = seeds
        .iter()
        .flat_map(|t| [t.head.clone(), t.tail.clone()])
        .collect();

    if max_neighbors_per_hop == 0 {
        return working.into_iter().collect();
    }

    for hop in 0..hops {
        let mut discovered: BTreeSet<Triple> = BTreeSet::new();

        for triple in &working {
            let mut endpoints = [triple.head.as_str(), triple.tail.as_str()];
            endpoints.sort_unstable();

            for entity in endpoints {
                for neighbor in store
                    .neighbors(entity)
                    .into_iter()
                    .take(max_neighbors_per_hop)
                {
                    if visited.contains(neighbor) {
                        continue;
                    }
                    if let Some(relation) = store.relation_of(entity, neighbor) {
                        discovered.insert(Triple::new(entity, relation, neighbor));
                    }
                    if let Some(relation) = store.relation_of(neighbor, entity) {
                        discovered.insert(Triple::new(neighbor, relation, entity));
                    }
                    visited.insert(neighbor.to_string());
                }
            }
        }

        log::debug!(
            "Expansion hop {}: {} new triples, {} nodes visited",
            hop + 1,
            discovered.len(),
            visited.len()
        );

        // Nothing new means every later round is a no-op too
        if discovered.is_empty() {
            break;
        }
        working.extend(discovered);
    }

    working.into_iter().collect()
}
