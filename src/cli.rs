use std::{env, path::PathBuf};

use anyhow::{Result, anyhow};

pub const DEFAULT_CONFIG_PATH: &str = "./iam-reference.jsonc";

/// Config file to load: `--config <path>` if given, else the default file if
/// it exists, else `None` for built-in defaults.
pub fn config_path_from_args() -> Result<Option<PathBuf>> {
    let explicit = parse_config_flag(env::args().skip(1))?;
    if explicit.is_some() {
        return Ok(explicit);
    }

    let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
    Ok(fallback.is_file().then_some(fallback))
}

fn parse_config_flag(args: impl IntoIterator<Item = String>) -> Result<Option<PathBuf>> {
    let mut args = args.into_iter();
    let mut config_path = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --config"))?;
                config_path = Some(PathBuf::from(value));
            }
            other => {
                return Err(anyhow!(
                    "unknown argument: {other}. usage: iam-reference-mcp [--config <path>]"
                ));
            }
        }
    }

    Ok(config_path)
}
