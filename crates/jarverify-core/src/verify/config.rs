use crate::classfile::DecodeOptions;
use crate::diff::DiffOptions;

/// Run-wide configuration.
///
/// Built by the caller from command-line flags; the core never reads
/// configuration from files or the environment.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    pub decode: DecodeOptions,
    pub diff: DiffOptions,
    /// File extensions (without the dot) treated as archives during the walk.
    pub archive_extensions: Vec<String>,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            decode: DecodeOptions::default(),
            diff: DiffOptions::default(),
            archive_extensions: vec!["jar".to_string()],
        }
    }
}

impl VerifyConfig {
    pub fn is_archive(&self, file_name: &str) -> bool {
        self.archive_extensions.iter().any(|ext| {
            file_name
                .strip_suffix(ext.as_str())
                .is_some_and(|stem| stem.len() > 1 && stem.ends_with('.'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::AddedDetection;

    #[test]
    fn defaults_skip_code_and_debug() {
        let config = VerifyConfig::default();

        assert!(config.decode.skip_code);
        assert!(config.decode.skip_debug);
        assert_eq!(config.diff.added_detection, AddedDetection::Enabled);
    }

    #[test]
    fn matches_archive_extensions() {
        let config = VerifyConfig {
            archive_extensions: vec!["jar".into(), "war".into()],
            ..Default::default()
        };

        assert!(config.is_archive("lib-1.0.jar"));
        assert!(config.is_archive("app.war"));
        assert!(!config.is_archive("lib-1.0.jar.sha1"));
        assert!(!config.is_archive("lib-1.0.pom"));
        assert!(!config.is_archive(".jar"));
        assert!(!config.is_archive("notajar"));
    }
}
