use crate::config::Config;
use eyre::{Result, WrapErr};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory layout for one run: `<output>/<host>/<viewport>/<index>.<path>.png`.
#[derive(Debug, Clone)]
pub struct OutputPlan {
    base_dir: PathBuf,
    index_width: usize,
}

impl OutputPlan {
    /// Resolve `<output>/<host>` against the working directory and create it.
    pub fn create(config: &Config) -> Result<Self> {
        let cwd = std::env::current_dir().wrap_err("failed to read current directory")?;
        let base_dir = cwd.join(&config.output).join(&config.host);
        fs::create_dir_all(&base_dir)
            .wrap_err_with(|| format!("failed to create {}", base_dir.display()))?;
        tracing::info!("Writing screenshots under {}", base_dir.display());
        Ok(Self {
            base_dir,
            index_width: index_width(config.paths.len()),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// `<base>/<viewport>`, created on first use.
    pub fn viewport_dir(&self, viewport: &str) -> Result<PathBuf> {
        let dir = self.base_dir.join(viewport);
        fs::create_dir_all(&dir).wrap_err_with(|| format!("failed to create {}", dir.display()))?;
        Ok(dir)
    }

    /// `index` is 1-based.
    pub fn file_name(&self, index: usize, path: &str) -> String {
        format!(
            "{:0width$}.{}.png",
            index,
            sanitize_path(path),
            width = self.index_width
        )
    }

    pub fn file_path(&self, viewport: &str, index: usize, path: &str) -> Result<PathBuf> {
        Ok(self.viewport_dir(viewport)?.join(self.file_name(index, path)))
    }
}

/// Digits needed for the largest index, at least one.
pub fn index_width(total_paths: usize) -> usize {
    total_paths.to_string().len().max(1)
}

/// Non-alphanumerics become `_`, outer underscores are trimmed, empty becomes `home`.
///
/// Replacement is per UTF-16 code unit, so a character outside the BMP (an emoji)
/// leaves two underscores.
pub fn sanitize_path(path: &str) -> String {
    let mut replaced = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_alphanumeric() {
            replaced.push(c);
        } else {
            replaced.extend(std::iter::repeat_n('_', c.len_utf16()));
        }
    }
    let trimmed = replaced.trim_matches('_');
    if trimmed.is_empty() {
        "home".to_string()
    } else {
        trimmed.to_string()
    }
}
