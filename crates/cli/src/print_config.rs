// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use veil_config::EngineConfig;

pub fn execute(config: &EngineConfig) -> Result<()> {
    match config.config_file() {
        Some(path) => println!("# {}", path.display()),
        None => println!("# no config file, defaults and environment only"),
    }
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}
