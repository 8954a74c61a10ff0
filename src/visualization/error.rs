use thiserror::Error;

/// Result alias used throughout the visualization core.
pub type Result<T> = std::result::Result<T, VisualizationError>;

/// Errors surfaced to callers of the visualization core.
#[derive(Debug, Error)]
pub enum VisualizationError {
	/// A relationship references a node id absent from the node set.
	#[error("relationship `{relationship}` references missing node `{node}`")]
	MissingEndpoint { relationship: String, node: String },
	#[error("unknown node `{0}`")]
	UnknownNode(String),
	#[error("unknown relationship `{0}`")]
	UnknownRelationship(String),
	#[error("style parse error: {0}")]
	StyleParse(String),
	#[error(transparent)]
	Json(#[from] serde_json::Error),
}
