//! Utility module for command line interfaces

use std::{env, error::Error, fmt, fmt::Display, str::FromStr};

/// An error struct to wrap simple static error messages
#[derive(Debug)]
pub struct CliErr(pub &'static str);

impl Display for CliErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Error for CliErr {}

/// Read a parameter from the environment, falling back to `default` when the var is not set.
/// Unparsable values are an error rather than silently ignored.
pub fn env_param<T: FromStr>(var: &str, default: T) -> Result<T, CliErr> {
    match env::var(var) {
        Ok(val) => val.parse().map_err(|_| CliErr("Could not parse env var parameter")),
        Err(_) => Ok(default),
    }
}
