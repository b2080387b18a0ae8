//! Pheromone update rules.
//!
//! Strength changes are computed per edge from its current value only, so the
//! order in which edges are visited within a pass does not matter. Clamping is
//! left to `Graph::set_pheromone`.

use crate::config::PheromoneParams;
use crate::error::NavigationError;
use crate::model::Graph;

/// Strength of a reinforced edge, before clamping.
pub fn deposited(strength: f64, params: &PheromoneParams) -> f64 {
    strength + params.deposit
}

/// Strength of an evaporating edge, before clamping.
pub fn evaporated(strength: f64, params: &PheromoneParams) -> f64 {
    strength * (1.0 - params.evaporation_rate)
}

/// Apply one navigation event to the whole graph.
///
/// Every edge ending at `target` receives the deposit; every other edge evaporates.
///
/// # Errors
/// Fails without touching the graph if `target` is not one of its nodes.
pub fn reinforce(graph: &mut Graph, target: &str) -> Result<(), NavigationError> {
    if !graph.contains_node(target) {
        return Err(NavigationError::UnknownTarget(target.to_string()));
    }

    let params = graph.params().clone();
    let mut n_reinforced = 0;
    for i_edge in 0..graph.edges().len() {
        let edge = &graph.edges()[i_edge];
        let strength = if edge.target == target {
            n_reinforced += 1;
            deposited(edge.pheromone_strength, &params)
        } else {
            evaporated(edge.pheromone_strength, &params)
        };
        graph.set_pheromone(i_edge, strength);
    }

    log::debug!(
        "reinforced {n_reinforced} edges ending at {target}, evaporated {}",
        graph.edges().len() - n_reinforced
    );

    Ok(())
}

/// Evaporate every edge of the graph once.
pub fn evaporate(graph: &mut Graph) {
    let params = graph.params().clone();
    for i_edge in 0..graph.edges().len() {
        let strength = evaporated(graph.edges()[i_edge].pheromone_strength, &params);
        graph.set_pheromone(i_edge, strength);
    }
}
