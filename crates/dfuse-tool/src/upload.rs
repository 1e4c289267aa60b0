use std::{
    fmt::Display,
    path::{Path, PathBuf},
    process::Command,
};

use derive_ctor::ctor;

use crate::{Result, err::Error};

pub const DEFAULT_DFU_UTIL: &str = "dfu-util";

/// External `dfu-util` invocation
#[derive(Debug, ctor)]
pub struct DfuUtil {
    program: String,
    alt_setting: u8,
}

impl Display for DfuUtil {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\" --alt {}", self.program, self.alt_setting)
    }
}

impl DfuUtil {
    /// Fall back to `dfu-util` from `PATH` when the build system left the variable unexpanded
    pub fn resolve(program: Option<&str>, alt_setting: u8) -> Self {
        let program = match program.map(str::trim) {
            Some(p) if !p.is_empty() && p != "$DFUUTIL" => p,
            _ => DEFAULT_DFU_UTIL,
        };
        Self::new(program.to_string(), alt_setting)
    }

    pub fn command(&self, file: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--alt")
            .arg(self.alt_setting.to_string())
            .arg("--download")
            .arg(file);
        cmd
    }

    /// Command line as it would be typed in a shell
    pub fn command_line(&self, file: &Path) -> String {
        format!("{self} --download \"{}\"", file.display())
    }

    /// Flash `file` and wait for `dfu-util` to finish
    pub fn download(&self, file: &Path) -> Result<()> {
        if !file.exists() {
            return Err(Error::InputNotFound(file.to_path_buf()));
        }

        let status = self.command(file).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::DfuUtil(self.program.clone(), status))
        }
    }
}

/// Image flashed by default: the latest post-build output
pub fn default_file(project_dir: &Path) -> PathBuf {
    project_dir
        .join(crate::output::DFU_DIR)
        .join(crate::output::LATEST_NAME)
}
