//! External tool environment
//!
//! fwflash never locates or installs the flashing utility or the build tool
//! itself. Whoever sets up the environment (a virtualenv bootstrapper, the
//! user's shell, a config file) hands over a [`ToolEnvironment`] and the
//! sequencer only builds command lines from it.

use fwflash_core::fs_image::UploadFs;
use fwflash_core::FlashPlan;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Environment variable the build tool reads the project root from
pub const DEFAULT_PROJECT_ROOT_VAR: &str = "PLATFORMIO_DIR";

/// Paths and settings for the external tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolEnvironment {
    /// Interpreter the flashing utility runs under
    pub interpreter: PathBuf,
    /// Arguments placed between the interpreter and the flasher options
    /// (`-m esptool`)
    pub flasher_args: Vec<OsString>,
    /// Build tool executable
    pub build_tool: PathBuf,
    /// Variable set to the project root for build tool runs
    pub project_root_var: String,
    /// Extra variables for build tool runs
    pub build_env: Vec<(String, String)>,
}

impl Default for ToolEnvironment {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from("python3"),
            flasher_args: vec!["-m".into(), "esptool".into()],
            build_tool: PathBuf::from("pio"),
            project_root_var: DEFAULT_PROJECT_ROOT_VAR.to_string(),
            build_env: Vec::new(),
        }
    }
}

impl ToolEnvironment {
    /// `write_flash` invocation for every active region of `plan`
    pub fn write_flash(&self, port: &str, baud: u32, plan: &FlashPlan) -> Invocation {
        Invocation::new(&self.interpreter)
            .args(&self.flasher_args)
            .args(["--port", port])
            .arg("--baud")
            .arg(baud.to_string())
            .args(["write_flash", "-z"])
            .args(plan.to_args())
    }

    /// Build tool upload-filesystem invocation
    pub fn upload_fs(&self, upload: &UploadFs) -> Invocation {
        let root = &upload.project.root;
        let mut invocation = Invocation::new(&self.build_tool)
            .args(["run", "-e"])
            .arg(&upload.project.environment)
            .args(["-t", "uploadfs"])
            .current_dir(root)
            .env(&self.project_root_var, root);
        for (key, value) in &self.build_env {
            invocation = invocation.env(key, value);
        }
        invocation
    }
}

/// A fully specified external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to run
    pub program: PathBuf,
    /// Arguments
    pub args: Vec<OsString>,
    /// Working directory, inherited if `None`
    pub cwd: Option<PathBuf>,
    /// Variables added to the inherited environment
    pub env: Vec<(OsString, OsString)>,
}

impl Invocation {
    /// Start an invocation of `program`
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Set the working directory
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Add an environment variable
    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.env
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    /// Arguments as lossy UTF-8, mostly for tests and messages
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Build a [`Command`] for this invocation
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd.envs(self.env.iter().map(|(k, v)| (k, v)));
        cmd
    }
}

/// Shell-like rendering, for logs and `--dry-run`
impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{}={} ", key.to_string_lossy(), quote(&value.to_string_lossy()))?;
        }
        write!(f, "{}", quote(&self.program.to_string_lossy()))?;
        for arg in &self.args {
            write!(f, " {}", quote(&arg.to_string_lossy()))?;
        }
        if let Some(dir) = &self.cwd {
            write!(f, "  (in {})", dir.display())?;
        }
        Ok(())
    }
}

fn quote(s: &str) -> String {
    if !s.is_empty() && !s.contains([' ', '\t', '"', '\'']) {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
