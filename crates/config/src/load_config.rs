// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::path::{Path, PathBuf};

use path_clean::clean;

pub type FindInParent = fn(&Path, &str) -> Option<PathBuf>;

/// Walk from `path` towards the filesystem root looking for `filename`
pub fn find_in_parent(path: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = path.to_path_buf();

    loop {
        let file_path = current.join(filename);
        if file_path.exists() {
            return Some(file_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Where the configuration comes from. An explicit file wins, then a file found above the
/// working directory, then the file in the default config folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    Discovered(PathBuf),
    Default(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            ConfigSource::Explicit(p) | ConfigSource::Discovered(p) | ConfigSource::Default(p) => p,
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, ConfigSource::Explicit(_))
    }
}

pub fn resolve_config_path(
    find_in_parent: FindInParent,
    cwd: impl Into<PathBuf>,
    default_config_dir: impl Into<PathBuf>,
    default_filename: &str,
    cli_file: Option<PathBuf>,
) -> ConfigSource {
    let cwd = cwd.into();

    if let Some(cli_file) = cli_file {
        if cli_file.is_absolute() {
            return ConfigSource::Explicit(cli_file);
        }
        return ConfigSource::Explicit(clean(cwd.join(cli_file)));
    }

    if let Some(found) = find_in_parent(&cwd, default_filename) {
        return ConfigSource::Discovered(found);
    }

    ConfigSource::Default(clean(default_config_dir.into().join(default_filename)))
}
