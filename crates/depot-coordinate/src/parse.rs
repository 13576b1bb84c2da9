use crate::{Coordinate, CoordinateError};
use std::str::FromStr;

/// File name prefix of per-artifact descriptors, stored without a version segment.
pub const METADATA_PREFIX: &str = "maven-metadata";
pub const PATH_SEPARATOR: char = '/';

pub fn is_metadata_file(file_name: &str) -> bool {
    file_name.starts_with(METADATA_PREFIX)
}

/// Parse a request path into a [`Coordinate`].
///
/// One leading separator is stripped, then the path is split into non-empty
/// segments which are assigned from the end: file name, version (skipped for
/// metadata descriptors), artifact, and everything before that is the group.
/// Segment content is accepted verbatim.
///
/// ```
/// use depot_coordinate::parse_coordinate;
///
/// let c = parse_coordinate("/org/example/widget-core/maven-metadata.xml").unwrap();
/// assert_eq!(c.group(), "org.example");
/// assert_eq!(c.artifact(), "widget-core");
/// assert_eq!(c.version(), None);
/// ```
pub fn parse_coordinate(path: &str) -> Result<Coordinate, CoordinateError> {
    let trimmed = path.strip_prefix(PATH_SEPARATOR).unwrap_or(path);
    if trimmed.is_empty() {
        return Err(CoordinateError::EmptyPath);
    }

    let segments: Vec<&str> = trimmed
        .split(PATH_SEPARATOR)
        .filter(|s| !s.is_empty())
        .collect();
    let malformed = || CoordinateError::Malformed {
        path: path.to_owned(),
        segments: segments.len(),
    };

    let (file_name, rest) = segments.split_last().ok_or_else(malformed)?;
    let (version, rest) = if is_metadata_file(file_name) {
        (None, rest)
    } else {
        let (version, rest) = rest.split_last().ok_or_else(malformed)?;
        (Some((*version).to_owned()), rest)
    };
    let (artifact, group) = rest.split_last().ok_or_else(malformed)?;
    if group.is_empty() {
        return Err(malformed());
    }

    Coordinate::new(group.iter().copied(), *artifact, version, *file_name)
}

impl FromStr for Coordinate {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_coordinate(s)
    }
}
