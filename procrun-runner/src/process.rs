// Defaults a ProcessRunner applies to every spec it runs

use crate::command::CommandSpec;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Used when a spec sets no timeout of its own.
    pub timeout: Option<Duration>,
    /// Used when a spec sets no working directory of its own.
    pub working_directory: Option<PathBuf>,
    /// Wildcard patterns removed from every spec's environment.
    pub remove_env: Vec<String>,
}

impl RunnerConfig {
    pub(crate) fn apply(&self, mut spec: CommandSpec) -> CommandSpec {
        if !spec.has_timeout_setting() {
            if let Some(timeout) = self.timeout {
                spec = spec.timeout(timeout);
            }
        }
        if spec.get_current_dir().is_none() {
            if let Some(dir) = &self.working_directory {
                spec = spec.current_dir(dir);
            }
        }
        if !self.remove_env.is_empty() {
            spec = spec.remove_env(&self.remove_env);
        }
        spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;
    use std::path::Path;

    #[test]
    fn test_default_config_changes_nothing() {
        let spec = RunnerConfig::default().apply(CommandSpec::new("ls"));
        assert!(spec.get_timeout().is_none());
        assert!(spec.get_current_dir().is_none());
        assert_eq!(spec.get_env(), &Environment::Inherit);
    }

    #[test]
    fn test_config_fills_unset_values() {
        let config = RunnerConfig {
            timeout: Some(Duration::from_secs(5)),
            working_directory: Some(PathBuf::from("/tmp")),
            remove_env: vec!["SECRET_*".to_string()],
        };
        let spec = config.apply(CommandSpec::new("ls").env(["SECRET_TOKEN=x", "HOME=/x"]));

        assert_eq!(spec.get_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(spec.get_current_dir(), Some(Path::new("/tmp")));
        assert_eq!(
            spec.get_env(),
            &Environment::Explicit(vec!["HOME=/x".to_string()])
        );
    }

    #[test]
    fn test_spec_settings_win() {
        let config = RunnerConfig {
            timeout: Some(Duration::from_secs(5)),
            working_directory: Some(PathBuf::from("/tmp")),
            remove_env: Vec::new(),
        };
        let spec = config.apply(
            CommandSpec::new("ls")
                .timeout(Duration::ZERO)
                .current_dir("/var"),
        );

        assert!(spec.get_timeout().is_none());
        assert_eq!(spec.get_current_dir(), Some(Path::new("/var")));
    }
}
