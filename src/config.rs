//! Config file loading
//!
//! Settings that rarely change between runs live in a TOML file:
//!
//! ```toml
//! [device]
//! port = "/dev/ttyUSB0"
//! baud = 921600
//!
//! [project]
//! root = "."
//! environment = "esp32dev"
//!
//! [tools]
//! python = ".pio_cli_env/bin/python"
//! flasher_args = ["-m", "esptool"]
//! build_tool = ".pio_cli_env/bin/pio"
//! project_root_var = "PLATFORMIO_DIR"
//!
//! [tools.env]
//! PLATFORMIO_CORE_DIR = ".pio_core"
//! ```
//!
//! Command-line flags always win over the file.

use crate::cli::FlashArgs;
use fwflash_core::fs_image::BuildProject;
use fwflash_core::FlashRegion;
use fwflash_seq::{FlashRequest, ToolEnvironment};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "fwflash.toml";

/// Baud rate used when neither flags nor config name one
pub const DEFAULT_BAUD: u32 = 921600;

/// Errors from loading a config file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML or has the wrong shape
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Contents of a config file
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub device: DeviceConfig,
    pub project: ProjectConfig,
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    pub port: Option<String>,
    pub baud: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub root: Option<PathBuf>,
    pub environment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    pub python: Option<PathBuf>,
    pub flasher_args: Option<Vec<String>>,
    pub build_tool: Option<PathBuf>,
    pub project_root_var: Option<String>,
    pub env: BTreeMap<String, String>,
}

impl Config {
    /// Load `path`, or [`DEFAULT_CONFIG_FILE`] if it exists
    ///
    /// An explicitly named file must exist; a missing default file just
    /// means an empty config.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_toml_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_toml_file(default)
                } else {
                    log::debug!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load a config from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Tool environment: built-in defaults, then `[tools]`, then flags
    pub fn tool_environment(&self, args: &FlashArgs) -> ToolEnvironment {
        let mut tools = ToolEnvironment::default();
        let cfg = &self.tools;

        if let Some(python) = args.python.as_ref().or(cfg.python.as_ref()) {
            tools.interpreter = python.clone();
        }
        if let Some(flasher_args) = &cfg.flasher_args {
            tools.flasher_args = flasher_args.iter().map(Into::into).collect();
        }
        if let Some(build_tool) = args.build_tool.as_ref().or(cfg.build_tool.as_ref()) {
            tools.build_tool = build_tool.clone();
        }
        if let Some(var) = &cfg.project_root_var {
            tools.project_root_var = var.clone();
        }
        tools.build_env = cfg
            .env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        tools
    }

    /// The build project, if an environment is known
    ///
    /// The root defaults to the current directory.
    pub fn project(&self, args: &FlashArgs) -> Option<BuildProject> {
        let environment = args
            .env
            .clone()
            .or_else(|| self.project.environment.clone())?;
        let root = args
            .project_dir
            .clone()
            .or_else(|| self.project.root.clone())
            .unwrap_or_else(|| PathBuf::from("."));
        Some(BuildProject { root, environment })
    }

    /// Build a flash request from flags and config
    ///
    /// Image paths not given fall back to the build project's output
    /// directory. Anything still missing is left empty for
    /// [`FlashRequest::validate`] to report.
    pub fn flash_request(&self, args: &FlashArgs) -> FlashRequest {
        let project = self.project(args);
        let build_dir = project
            .as_ref()
            .map(|p| p.root.join(".pio").join("build").join(&p.environment));

        let image = |given: &Option<PathBuf>, file_name: &str| -> PathBuf {
            given
                .clone()
                .or_else(|| build_dir.as_ref().map(|dir| dir.join(file_name)))
                .unwrap_or_default()
        };

        let mut request = FlashRequest::new(
            args.port
                .clone()
                .or_else(|| self.device.port.clone())
                .unwrap_or_default(),
            Some(args.baud.or(self.device.baud).unwrap_or(DEFAULT_BAUD)),
            FlashRegion::new(args.bootloader_offset, image(&args.bootloader, "bootloader.bin")),
            FlashRegion::new(
                args.partition_table_offset,
                image(&args.partition_table, "partition-table.bin"),
            ),
            FlashRegion::new(args.firmware_offset, image(&args.firmware, "firmware.bin")),
        );
        request.fs_source = args.fs.clone().unwrap_or_default();
        request.fs_offset = args.fs_offset.clone();
        request.partitions_csv = args.partitions.clone();
        request.project = project;
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn args() -> FlashArgs {
        FlashArgs {
            bootloader_offset: 0x1000,
            partition_table_offset: 0x8000,
            firmware_offset: 0x10000,
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
[device]
port = "/dev/ttyUSB1"
baud = 460800

[project]
root = "/work/lamp"
environment = "esp32dev"

[tools]
python = "/venv/bin/python"
flasher_args = ["-m", "esptool", "--chip", "esp32"]
build_tool = "/venv/bin/pio"

[tools.env]
PLATFORMIO_CORE_DIR = "/work/.pio_core"
"#,
        )
        .unwrap();

        assert_eq!(config.device.port.as_deref(), Some("/dev/ttyUSB1"));
        assert_eq!(config.device.baud, Some(460800));
        assert_eq!(config.project.environment.as_deref(), Some("esp32dev"));
        assert_eq!(config.tools.env.len(), 1);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(toml::from_str::<Config>("[device]\nspeed = 1\n").is_err());
    }

    #[test]
    fn test_tool_precedence() {
        let mut config = Config::default();
        let tools = config.tool_environment(&args());
        assert_eq!(tools, ToolEnvironment::default());

        config.tools.python = Some("/venv/bin/python".into());
        config.tools.build_tool = Some("/venv/bin/pio".into());
        config.tools.flasher_args = Some(vec![
            "-m".into(),
            "esptool".into(),
            "--chip".into(),
            "esp32".into(),
        ]);
        config.tools.env.insert("A".into(), "1".into());

        let mut flags = args();
        flags.build_tool = Some("/opt/pio".into());
        let tools = config.tool_environment(&flags);

        assert_eq!(tools.interpreter, PathBuf::from("/venv/bin/python"));
        assert_eq!(tools.build_tool, PathBuf::from("/opt/pio"));
        assert_eq!(tools.flasher_args.len(), 4);
        assert_eq!(tools.flasher_args[3], OsString::from("esp32"));
        assert_eq!(tools.build_env, vec![("A".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_request_defaults_from_project() {
        let mut config = Config::default();
        config.device.port = Some("/dev/ttyUSB1".into());
        config.project.root = Some("/work/lamp".into());
        config.project.environment = Some("esp32dev".into());

        let request = config.flash_request(&args());

        assert_eq!(request.port, "/dev/ttyUSB1");
        assert_eq!(request.baud, Some(DEFAULT_BAUD));
        assert_eq!(
            request.bootloader.image(),
            Some(Path::new("/work/lamp/.pio/build/esp32dev/bootloader.bin"))
        );
        assert_eq!(
            request.partition_table.image(),
            Some(Path::new("/work/lamp/.pio/build/esp32dev/partition-table.bin"))
        );
        assert_eq!(request.firmware.offset.value(), 0x10000);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        config.device.port = Some("/dev/ttyUSB1".into());
        config.device.baud = Some(115200);
        config.project.environment = Some("esp32dev".into());

        let mut flags = args();
        flags.port = Some("/dev/ttyACM0".into());
        flags.baud = Some(460800);
        flags.env = Some("lolin32".into());
        flags.firmware = Some("app.bin".into());
        let request = config.flash_request(&flags);

        assert_eq!(request.port, "/dev/ttyACM0");
        assert_eq!(request.baud, Some(460800));
        assert_eq!(request.firmware.image(), Some(Path::new("app.bin")));
        let project = request.project.unwrap();
        assert_eq!(project.environment, "lolin32");
        assert_eq!(project.root, PathBuf::from("."));
    }

    #[test]
    fn test_request_without_project_is_incomplete() {
        let mut flags = args();
        flags.port = Some("/dev/ttyUSB0".into());
        let request = Config::default().flash_request(&flags);
        assert!(request.project.is_none());
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = Config::load(Some(dir.path().join("nope.toml").as_path())).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("fwflash.toml");
        fs::write(&path, "[device\n").unwrap();
        let err = Config::from_toml_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
