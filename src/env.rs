use anyhow::{anyhow, Context as _};
use std::fs;

/// Loads the development environment from `./.env.toml`, setting each key
/// as a process environment variable. Production deployments configure the
/// environment directly and have no such file.
pub fn load_dotenv() -> anyhow::Result<()> {
    let env: toml::map::Map<String, toml::Value> = toml::de::from_str(
        &fs::read_to_string("./.env.toml").context("no .env.toml file found")?,
    )?;

    for (key, value) in env {
        let value = match value {
            toml::Value::String(value) => value,
            toml::Value::Integer(value) => value.to_string(),
            toml::Value::Float(value) => value.to_string(),
            toml::Value::Boolean(value) => value.to_string(),
            _ => {
                return Err(anyhow!(
                    "unsupported TOML value in .env.toml for key {}",
                    key
                ));
            }
        };
        std::env::set_var(key, value);
    }

    Ok(())
}
