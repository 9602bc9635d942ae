// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use std::{fs, io, path::Path};

/// Read a yaml file and expand `$VAR` / `${VAR}` references from the environment.
/// A missing file yields an empty document unless `required` is set.
pub fn load_yaml_with_env(file_path: &Path, required: bool) -> Result<String> {
    let content = match fs::read_to_string(file_path) {
        Ok(val) => val,
        Err(e) if e.kind() == io::ErrorKind::NotFound && !required => String::new(),
        Err(e) => return Err(e.into()),
    };

    Ok(shellexpand::env(&content)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn expands_environment_references() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("veil.config.yaml");
        let mut file = File::create(&file_path)?;
        writeln!(file, "administrator: ${{VEIL_TEST_YAML_ADMIN}}")?;

        std::env::set_var("VEIL_TEST_YAML_ADMIN", "0xabc");
        let processed = load_yaml_with_env(&file_path, true)?;
        assert_eq!(processed.trim(), "administrator: 0xabc");
        Ok(())
    }

    #[test]
    fn missing_optional_file_is_empty() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("absent.yaml");
        assert_eq!(load_yaml_with_env(&path, false)?, "");

        let err = load_yaml_with_env(&path, true).unwrap_err();
        let io_err = err.downcast_ref::<io::Error>().expect("io error");
        assert_eq!(io_err.kind(), io::ErrorKind::NotFound);
        Ok(())
    }
}
