use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::impl_case_insensitive_enum;

use super::PtfConfig;

/// Helper executable used when `Adapter.<name>.HelperPath` is not set.
pub const DEFAULT_HELPER: &str = "ptf-console";

/// Backend variant an adapter is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    Managed,
    Interactive,
    Shell,
}

impl_case_insensitive_enum!(
    AdapterKind,
    "adapter type",
    Managed => "managed",
    Interactive => "interactive",
    Shell => "shell"
);

/// Where an interactive adapter talks to the human
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum InteractiveMode {
    /// Prompt on this process's console.
    #[default]
    Console,
    /// Prompt from a spawned helper process.
    Process,
}

impl_case_insensitive_enum!(
    InteractiveMode,
    "interactive mode",
    Console => "console",
    Process => "process"
);

/// Resolved binding of one adapter name to a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterBinding {
    pub name: String,
    pub kind: AdapterKind,
    pub mode: InteractiveMode,
    pub helper_path: PathBuf,
    pub timeout: Option<Duration>,
    pub script_dir: Option<PathBuf>,
}

impl AdapterBinding {
    /// Read `Adapter.<name>.*` properties.
    pub fn from_config(config: &PtfConfig, name: &str) -> Result<Self> {
        let key = |suffix: &str| format!("Adapter.{name}.{suffix}");

        let kind = config
            .require(&key("Type"))?
            .parse::<AdapterKind>()
            .map_err(Error::Config)?;

        let mode = match config.get(&key("Mode")) {
            Some(raw) => raw.parse::<InteractiveMode>().map_err(Error::Config)?,
            None => InteractiveMode::default(),
        };

        let helper_path = config
            .get(&key("HelperPath"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HELPER));

        let timeout = config
            .get_parsed::<u64>(&key("TimeoutSeconds"))?
            .map(Duration::from_secs);

        let script_dir = config.get(&key("ScriptDirectory")).map(PathBuf::from);
        if kind == AdapterKind::Shell && script_dir.is_none() {
            return Err(Error::Config(format!(
                "Shell adapter '{name}' requires '{}'",
                key("ScriptDirectory")
            )));
        }

        Ok(Self {
            name: name.to_string(),
            kind,
            mode,
            helper_path,
            timeout,
            script_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interactive_process_binding() {
        let config = PtfConfig::new()
            .with("Adapter.ISutControl.Type", "Interactive")
            .with("adapter.isutcontrol.mode", "PROCESS")
            .with("Adapter.ISutControl.HelperPath", "/opt/ptf/ptf-console")
            .with("Adapter.ISutControl.TimeoutSeconds", "30");

        let binding = AdapterBinding::from_config(&config, "ISutControl").unwrap();
        assert_eq!(binding.kind, AdapterKind::Interactive);
        assert_eq!(binding.mode, InteractiveMode::Process);
        assert_eq!(binding.helper_path, PathBuf::from("/opt/ptf/ptf-console"));
        assert_eq!(binding.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_defaults() {
        let config = PtfConfig::new().with("Adapter.IFoo.Type", "interactive");

        let binding = AdapterBinding::from_config(&config, "IFoo").unwrap();
        assert_eq!(binding.mode, InteractiveMode::Console);
        assert_eq!(binding.helper_path, PathBuf::from(DEFAULT_HELPER));
        assert_eq!(binding.timeout, None);
    }

    #[test]
    fn test_missing_or_unknown_type() {
        let err = AdapterBinding::from_config(&PtfConfig::new(), "IFoo").unwrap_err();
        assert!(err.to_string().contains("Adapter.IFoo.Type"));

        let config = PtfConfig::new().with("Adapter.IFoo.Type", "rpc");
        let err = AdapterBinding::from_config(&config, "IFoo").unwrap_err();
        assert!(err.to_string().contains(
            "unknown adapter type 'rpc', expected one of: managed, interactive, shell"
        ));
    }

    #[test]
    fn test_shell_requires_script_directory() {
        let config = PtfConfig::new().with("Adapter.IFoo.Type", "shell");
        assert!(matches!(
            AdapterBinding::from_config(&config, "IFoo"),
            Err(Error::Config(_))
        ));
    }
}
