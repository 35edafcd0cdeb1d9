//! `${VAR}` and `${VAR:-default}` references in settings strings.
//!
//! Only the braced form is recognized; a bare `$` is kept as written, which
//! matters for `args` passed through to the tool.

use std::env::{self, VarError};
use std::path::{Path, PathBuf};

use crate::{ConfigError, Settings};

impl Settings {
    /// Expand references in every string field the tool invocation uses.
    ///
    /// Runs before relative paths are resolved, so a variable may hold an
    /// absolute directory.
    pub(crate) fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.working_dir = expand_path(&self.working_dir, "working_dir")?;
        self.output_dir = expand_path(&self.output_dir, "output_dir")?;
        self.command = expand_env(&self.command, "command")?;
        for (i, arg) in self.args.iter_mut().enumerate() {
            if arg.contains("${") {
                *arg = expand_env(arg, &format!("args[{i}]"))?;
            }
        }
        self.background_color = expand_env(&self.background_color, "background_color")?;
        self.url_prefix = expand_env(&self.url_prefix, "url_prefix")?;
        Ok(())
    }
}

/// Expand a path, leaving non-UTF-8 paths untouched.
fn expand_path(path: &Path, field: &str) -> Result<PathBuf, ConfigError> {
    match path.to_str() {
        Some(s) if s.contains("${") => Ok(PathBuf::from(expand_env(s, field)?)),
        _ => Ok(path.to_path_buf()),
    }
}

/// Expand the references in one value of settings field `field`.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, lookup)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: match e.cause {
                VarError::NotPresent => format!("${{{}}} not set", e.var_name),
                VarError::NotUnicode(_) => format!("${{{}}} is not valid UTF-8", e.var_name),
            },
        })
}

/// Unset variables are errors so `${VAR:-default}` is the only way to opt out.
fn lookup(var: &str) -> Result<Option<String>, VarError> {
    env::var(var).map(Some)
}
