use crate::parse::{is_metadata_file, PATH_SEPARATOR};
use crate::CoordinateError;
use std::fmt;

/// The structured address of one artifact file.
///
/// Immutable once built. `group` is derived from `group_segments` at
/// construction and never set independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    group_segments: Vec<String>,
    group: String,
    artifact: String,
    version: Option<String>,
    file_name: String,
}

impl Coordinate {
    /// Build a coordinate, checking that no field is empty and that only a
    /// metadata descriptor may omit its version.
    pub fn new<S: Into<String>>(
        group_segments: impl IntoIterator<Item = S>,
        artifact: impl Into<String>,
        version: Option<String>,
        file_name: impl Into<String>,
    ) -> Result<Self, CoordinateError> {
        let group_segments: Vec<String> = group_segments.into_iter().map(Into::into).collect();
        let artifact = artifact.into();
        let file_name = file_name.into();

        if group_segments.is_empty() || group_segments.iter().any(String::is_empty) {
            return Err(CoordinateError::EmptyField("group"));
        }
        if artifact.is_empty() {
            return Err(CoordinateError::EmptyField("artifact"));
        }
        if file_name.is_empty() {
            return Err(CoordinateError::EmptyField("file_name"));
        }
        match version.as_deref() {
            Some("") => return Err(CoordinateError::EmptyField("version")),
            None if !is_metadata_file(&file_name) => {
                return Err(CoordinateError::MissingVersion(file_name));
            }
            _ => {}
        }

        let group = group_segments.join(".");
        Ok(Self {
            group_segments,
            group,
            artifact,
            version,
            file_name,
        })
    }

    #[inline]
    pub fn group_segments(&self) -> &[String] {
        &self.group_segments
    }

    /// Group segments joined with `.`, e.g. `org.example.widgets`.
    #[inline]
    pub fn group(&self) -> &str {
        &self.group
    }

    #[inline]
    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    #[inline]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    #[inline]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn is_metadata(&self) -> bool {
        is_metadata_file(&self.file_name)
    }

    /// Every path segment in layout order: group segments, artifact,
    /// version when present, file name.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.group_segments
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.artifact.as_str()))
            .chain(self.version.as_deref())
            .chain(std::iter::once(self.file_name.as_str()))
    }

    /// Relative request path for this coordinate, without a leading separator.
    pub fn relative_path(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments().enumerate() {
            if i > 0 {
                out.push(PATH_SEPARATOR);
            }
            out.push_str(segment);
        }
        out
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)?;
        if let Some(version) = &self.version {
            write!(f, ":{version}")?;
        }
        write!(f, ":{}", self.file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jar() -> Coordinate {
        Coordinate::new(
            ["org", "example"],
            "widget-core",
            Some("1.2.0".to_owned()),
            "widget-core-1.2.0.jar",
        )
        .unwrap()
    }

    #[test]
    fn group_is_joined_with_dots() {
        let c = jar();
        assert_eq!(c.group(), "org.example");
        assert_eq!(c.group_segments(), ["org", "example"]);
    }

    #[test]
    fn relative_path_includes_version() {
        assert_eq!(
            jar().relative_path(),
            "org/example/widget-core/1.2.0/widget-core-1.2.0.jar"
        );
    }

    #[test]
    fn relative_path_omits_absent_version() {
        let c = Coordinate::new(["org"], "widget-core", None, "maven-metadata.xml").unwrap();
        assert_eq!(c.relative_path(), "org/widget-core/maven-metadata.xml");
        assert!(c.is_metadata());
    }

    #[test]
    fn display_is_colon_separated() {
        assert_eq!(
            jar().to_string(),
            "org.example:widget-core:1.2.0:widget-core-1.2.0.jar"
        );
    }

    #[test]
    fn rejects_empty_group() {
        let err = Coordinate::new(Vec::<String>::new(), "a", Some("1".to_owned()), "a.jar")
            .unwrap_err();
        assert_eq!(err, CoordinateError::EmptyField("group"));
    }

    #[test]
    fn rejects_empty_version_string() {
        let err = Coordinate::new(["org"], "a", Some(String::new()), "a.jar").unwrap_err();
        assert_eq!(err, CoordinateError::EmptyField("version"));
    }

    #[test]
    fn rejects_missing_version_for_regular_file() {
        let err = Coordinate::new(["org"], "a", None, "a.jar").unwrap_err();
        assert_eq!(err, CoordinateError::MissingVersion("a.jar".to_owned()));
    }

    #[test]
    fn rejects_empty_artifact_and_file_name() {
        assert_eq!(
            Coordinate::new(["org"], "", Some("1".to_owned()), "a.jar").unwrap_err(),
            CoordinateError::EmptyField("artifact")
        );
        assert_eq!(
            Coordinate::new(["org"], "a", Some("1".to_owned()), "").unwrap_err(),
            CoordinateError::EmptyField("file_name")
        );
    }
}
