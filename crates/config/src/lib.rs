// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod engine_config;
pub mod load_config;
mod signing_key;
mod yaml;

pub use engine_config::*;
pub use signing_key::*;
pub use yaml::load_yaml_with_env;
