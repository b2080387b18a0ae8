use thiserror::Error;

/// Graph construction failure.
#[derive(Error, Debug, PartialEq)]
pub enum InvalidGraphError {
    #[error("edge {from} -> {to} references unknown node {missing}")]
    UnknownNode {
        from: String,
        to: String,
        missing: String,
    },

    #[error("duplicate node id {0}")]
    DuplicateNode(String),
}

/// Rejected navigation event.
#[derive(Error, Debug, PartialEq)]
pub enum NavigationError {
    #[error("navigation target {0} is not a node of the graph")]
    UnknownTarget(String),
}
