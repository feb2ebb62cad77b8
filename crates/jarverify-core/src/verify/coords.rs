use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Repository coordinates of one published artifact.
///
/// The string form is `group:artifact[:extension[:classifier]]:version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Coordinates {
    pub group_id: String,
    pub artifact_id: String,
    pub extension: Option<String>,
    pub classifier: Option<String>,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot derive coordinates from {path}: {reason}")]
pub struct CoordinateDerivationError {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid coordinates '{input}': expected group:artifact[:extension[:classifier]]:version")]
pub struct ParseCoordinatesError {
    pub input: String,
}

impl Coordinates {
    pub fn new(group_id: &str, artifact_id: &str, version: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            extension: None,
            classifier: None,
            version: version.to_string(),
        }
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = Some(extension.to_string());
        self
    }

    pub fn with_classifier(mut self, classifier: &str) -> Self {
        self.classifier = Some(classifier.to_string());
        self
    }

    /// Version directory name: a timestamped snapshot version
    /// (`1.0-20240101.101010-3`) lives under `1.0-SNAPSHOT`.
    pub fn base_version(&self) -> String {
        match split_timestamped(&self.version) {
            Some(base) => format!("{base}{SNAPSHOT_SUFFIX}"),
            None => self.version.clone(),
        }
    }

    /// Relative path of this artifact in a standard repository layout.
    pub fn repository_path(&self) -> PathBuf {
        let mut path: PathBuf = self.group_id.split('.').collect();
        path.push(&self.artifact_id);
        path.push(self.base_version());

        let mut file_name = format!("{}-{}", self.artifact_id, self.version);
        if let Some(classifier) = &self.classifier {
            file_name.push('-');
            file_name.push_str(classifier);
        }
        file_name.push('.');
        file_name.push_str(self.extension.as_deref().unwrap_or("jar"));
        path.push(file_name);
        path
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)?;
        if let Some(extension) = &self.extension {
            write!(f, ":{extension}")?;
        }
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        write!(f, ":{}", self.version)
    }
}

impl FromStr for Coordinates {
    type Err = ParseCoordinatesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(ParseCoordinatesError { input: s.to_string() });
        }

        let coords = match parts.as_slice() {
            [g, a, v] => Coordinates::new(g, a, v),
            [g, a, e, v] => Coordinates::new(g, a, v).with_extension(e),
            [g, a, e, c, v] => Coordinates::new(g, a, v).with_extension(e).with_classifier(c),
            _ => return Err(ParseCoordinatesError { input: s.to_string() }),
        };
        Ok(coords)
    }
}

/// Derive coordinates from an archive path relative to a repository root.
///
/// The layout is `group/segments/artifact/version/file`, where the file
/// name is `artifact-version[-classifier].extension`. Derived coordinates
/// always carry the extension.
pub fn path_to_coordinates(relative: &Path) -> Result<Coordinates, CoordinateDerivationError> {
    let fail = |reason: &str| CoordinateDerivationError {
        path: relative.to_path_buf(),
        reason: reason.to_string(),
    };

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(s) => segments.push(
                s.to_str()
                    .ok_or_else(|| fail("path is not valid UTF-8"))?,
            ),
            Component::CurDir => {}
            _ => return Err(fail("path must be relative and normalised")),
        }
    }

    let [group @ .., artifact_id, base_version, file_name] = segments.as_slice() else {
        return Err(fail("expected group/artifact/version/file"));
    };
    if group.is_empty() {
        return Err(fail("expected group/artifact/version/file"));
    }

    let rest = file_name
        .strip_prefix(artifact_id)
        .and_then(|r| r.strip_prefix('-'))
        .ok_or_else(|| fail("file name does not start with the artifact id"))?;

    let (version, rest) = split_version(rest, base_version)
        .ok_or_else(|| fail("file name does not match the version directory"))?;

    let (classifier, extension) = if let Some(r) = rest.strip_prefix('-') {
        let (classifier, extension) = r
            .split_once('.')
            .ok_or_else(|| fail("file name has no extension"))?;
        (Some(classifier), extension)
    } else if let Some(extension) = rest.strip_prefix('.') {
        (None, extension)
    } else {
        return Err(fail("file name has no extension"));
    };

    if extension.is_empty() || classifier.is_some_and(str::is_empty) {
        return Err(fail("empty classifier or extension"));
    }

    let coords = Coordinates::new(&group.join("."), artifact_id, version).with_extension(extension);
    Ok(match classifier {
        Some(c) => coords.with_classifier(c),
        None => coords,
    })
}

/// Splits `rest` (file name after `artifact-`) into the file's version and
/// what follows it.
fn split_version<'a>(rest: &'a str, base_version: &str) -> Option<(&'a str, &'a str)> {
    if let Some(after) = rest.strip_prefix(base_version) {
        if after.is_empty() || after.starts_with('-') || after.starts_with('.') {
            return Some((&rest[..base_version.len()], after));
        }
    }

    // 1.0-SNAPSHOT/a-1.0-20240101.101010-3.jar
    let prefix = base_version.strip_suffix(SNAPSHOT_SUFFIX)?;
    let after_base = rest.strip_prefix(prefix)?.strip_prefix('-')?;
    let stamp_len = timestamp_len(after_base)?;
    let version_len = prefix.len() + 1 + stamp_len;
    Some((&rest[..version_len], &rest[version_len..]))
}

/// Length of a leading `yyyyMMdd.HHmmss-N` snapshot timestamp.
fn timestamp_len(s: &str) -> Option<usize> {
    let b = s.as_bytes();
    let digits = |range: std::ops::Range<usize>| b.get(range).is_some_and(|d| d.iter().all(u8::is_ascii_digit));

    if !(digits(0..8) && b.get(8) == Some(&b'.') && digits(9..15) && b.get(15) == Some(&b'-')) {
        return None;
    }
    let build = b[16..].iter().take_while(|c| c.is_ascii_digit()).count();
    (build > 0).then_some(16 + build)
}

/// For `1.0-20240101.101010-3`, returns `1.0`.
fn split_timestamped(version: &str) -> Option<&str> {
    version
        .char_indices()
        .filter(|(_, c)| *c == '-')
        .map(|(i, _)| i)
        .find(|&i| timestamp_len(&version[i + 1..]) == Some(version.len() - i - 1))
        .map(|i| &version[..i])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derive(path: &str) -> Result<String, CoordinateDerivationError> {
        path_to_coordinates(Path::new(path)).map(|c| c.to_string())
    }

    #[test]
    fn derives_plain_release() {
        assert_eq!(
            derive("org/example/lib/1.2.3/lib-1.2.3.jar").unwrap(),
            "org.example:lib:jar:1.2.3"
        );
    }

    #[test]
    fn derives_classifier_and_compound_extension() {
        assert_eq!(
            derive("org/example/lib/1.0/lib-1.0-sources.jar").unwrap(),
            "org.example:lib:jar:sources:1.0"
        );
        assert_eq!(
            derive("g/lib/1.0/lib-1.0-dist.tar.gz").unwrap(),
            "g:lib:tar.gz:dist:1.0"
        );
    }

    #[test]
    fn derives_hyphenated_artifact_and_version() {
        assert_eq!(
            derive("io/acme/my-lib/2.0-beta-1/my-lib-2.0-beta-1-tests.jar").unwrap(),
            "io.acme:my-lib:jar:tests:2.0-beta-1"
        );
    }

    #[test]
    fn derives_timestamped_snapshot() {
        let coords =
            path_to_coordinates(Path::new("g/a/1.0-SNAPSHOT/a-1.0-20240101.101010-3.jar")).unwrap();

        assert_eq!(coords.version, "1.0-20240101.101010-3");
        assert_eq!(coords.base_version(), "1.0-SNAPSHOT");
        assert_eq!(
            coords.repository_path(),
            Path::new("g/a/1.0-SNAPSHOT/a-1.0-20240101.101010-3.jar")
        );
    }

    #[test]
    fn plain_snapshot_keeps_its_version() {
        assert_eq!(
            derive("g/a/1.0-SNAPSHOT/a-1.0-SNAPSHOT.jar").unwrap(),
            "g:a:jar:1.0-SNAPSHOT"
        );
    }

    #[test]
    fn rejects_paths_outside_the_layout() {
        assert!(derive("lib-1.0.jar").is_err());
        assert!(derive("a/1.0/a-1.0.jar").is_err());
        assert!(derive("g/a/1.0/other-1.0.jar").is_err());
        assert!(derive("g/a/1.0/a-2.0.jar").is_err());
        assert!(derive("g/a/1.0/a-1.0").is_err());
        assert!(derive("g/../a/1.0/a-1.0.jar").is_err());
    }

    #[test]
    fn string_form_round_trips() {
        for s in ["g:a:1", "g:a:pom:1", "org.x:y:jar:sources:2.0"] {
            assert_eq!(s.parse::<Coordinates>().unwrap().to_string(), s);
        }
        assert!("g:a".parse::<Coordinates>().is_err());
        assert!("g::1".parse::<Coordinates>().is_err());
    }

    #[test]
    fn repository_path_defaults_to_jar() {
        let coords: Coordinates = "org.x:y:2.0".parse().unwrap();
        assert_eq!(coords.repository_path(), Path::new("org/x/y/2.0/y-2.0.jar"));
    }
}
