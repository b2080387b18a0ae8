//! Pheromone dynamics and ant traversal over a weighted user-journey graph.
//!
//! An [`Engine`] owns a validated [`Graph`] and a colony of [`AntAgent`]s.
//! [`Engine::step`] moves every ant one hop along an edge chosen with
//! probability proportional to its pheromone strength, and
//! [`Engine::reinforce`] applies a navigation event: edges ending at the
//! navigated node gain strength, every other edge evaporates.

pub mod analysis;
pub mod ant;
pub mod config;
pub mod engine;
pub mod error;
pub mod journey;
pub mod manager;
pub mod model;
pub mod pheromone;
pub mod stats;
mod utils;

pub use ant::{AntAgent, Hop};
pub use config::Config;
pub use engine::Engine;
pub use error::{InvalidGraphError, NavigationError};
pub use model::{Edge, Graph, GraphData, Node, Snapshot};
