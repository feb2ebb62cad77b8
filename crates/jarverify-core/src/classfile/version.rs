use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Class-file version.
///
/// The combined version word packs the minor version into the high 16 bits
/// and the major version into the low 16 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassVersion {
    pub major: u16,
    pub minor: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown class version: {major}.{minor}")]
pub struct UnknownClassVersion {
    pub major: u16,
    pub minor: u16,
}

/// Known `(major, minor)` pairs and the Java release that emits them.
const JAVA_VERSIONS: &[(u16, u16, &str)] = &[
    (45, 3, "1.1"),
    (46, 0, "1.2"),
    (47, 0, "1.3"),
    (48, 0, "1.4"),
    (49, 0, "1.5"),
    (50, 0, "1.6"),
    (51, 0, "1.7"),
    (52, 0, "8"),
    (53, 0, "9"),
    (54, 0, "10"),
    (55, 0, "11"),
    (56, 0, "12"),
    (57, 0, "13"),
    (58, 0, "14"),
    (59, 0, "15"),
    (60, 0, "16"),
    (61, 0, "17"),
    (62, 0, "18"),
    (63, 0, "19"),
    (64, 0, "20"),
    (65, 0, "21"),
    (66, 0, "22"),
    (67, 0, "23"),
];

impl ClassVersion {
    pub fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Splits a combined version word.
    pub fn from_word(word: u32) -> Self {
        Self {
            major: (word & 0xFFFF) as u16,
            minor: (word >> 16) as u16,
        }
    }

    pub fn to_word(self) -> u32 {
        ((self.minor as u32) << 16) | self.major as u32
    }

    /// Maps this version to the Java release that produces it.
    ///
    /// Only exact `(major, minor)` pairs from the table are accepted;
    /// preview minors and unlisted majors are errors.
    pub fn java_version(self) -> Result<&'static str, UnknownClassVersion> {
        JAVA_VERSIONS
            .iter()
            .find(|(major, minor, _)| *major == self.major && *minor == self.minor)
            .map(|(_, _, java)| *java)
            .ok_or(UnknownClassVersion {
                major: self.major,
                minor: self.minor,
            })
    }
}

impl std::fmt::Display for ClassVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.java_version() {
            Ok(java) => write!(f, "version {}.{} (Java {java})", self.major, self.minor),
            Err(_) => write!(f, "version {}.{} (unknown Java version)", self.major, self.minor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_splits_minor_high_major_low() {
        let v = ClassVersion::from_word(3 << 16 | 45);
        assert_eq!(v, ClassVersion::new(45, 3));
        assert_eq!(v.to_word(), 3 << 16 | 45);
    }

    #[test]
    fn maps_known_versions() {
        assert_eq!(ClassVersion::new(45, 3).java_version().unwrap(), "1.1");
        assert_eq!(ClassVersion::new(52, 0).java_version().unwrap(), "8");
        assert_eq!(ClassVersion::new(61, 0).java_version().unwrap(), "17");
    }

    #[test]
    fn unknown_versions_are_errors_not_defaults() {
        assert_eq!(
            ClassVersion::new(45, 0).java_version(),
            Err(UnknownClassVersion { major: 45, minor: 0 })
        );
        // Preview features set the minor to 0xFFFF.
        assert!(ClassVersion::new(61, 0xFFFF).java_version().is_err());
        assert!(ClassVersion::new(200, 0).java_version().is_err());
    }

    #[test]
    fn display_names_the_java_release() {
        assert_eq!(
            ClassVersion::new(55, 0).to_string(),
            "version 55.0 (Java 11)"
        );
        assert_eq!(
            ClassVersion::new(99, 0).to_string(),
            "version 99.0 (unknown Java version)"
        );
    }
}
