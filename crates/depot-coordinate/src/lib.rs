//! Artifact coordinates for depot.
//!
//! A [`Coordinate`] names one file in the repository by group, artifact,
//! optional version and file name. [`parse_coordinate`] decomposes a request
//! path such as `org/example/widget-core/1.2.0/widget-core-1.2.0.jar` into a
//! coordinate by assigning segments from the end of the path backwards.

pub mod coordinate;
pub mod parse;

pub use coordinate::Coordinate;
pub use parse::{is_metadata_file, parse_coordinate, METADATA_PREFIX, PATH_SEPARATOR};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    #[error("cannot resolve an artifact from an empty path")]
    EmptyPath,
    #[error("malformed artifact path '{path}': {segments} segment(s) is too few")]
    Malformed { path: String, segments: usize },
    #[error("coordinate field '{0}' must not be empty")]
    EmptyField(&'static str),
    #[error("version is required for non-metadata file '{0}'")]
    MissingVersion(String),
}
