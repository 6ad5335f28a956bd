//! Command-line arguments of the `buildlens` binary.

use crate::error::ClientError;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    /// Initial list query string, as it would appear in a shared link.
    pub query: String,
    /// Pages to load before printing.
    pub pages: u32,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            config: None,
            query: String::new(),
            pages: 1,
        }
    }
}

impl CliArgs {
    /// Parse `--config <path>`, `--query <qs>` and `--pages <n>`; the
    /// `--flag=value` form is accepted too.
    pub fn parse<I>(args: I) -> Result<Self, ClientError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => {
                    (flag.to_string(), Some(value.to_string()))
                }
                _ => (arg, None),
            };
            let mut value = || {
                inline
                    .clone()
                    .or_else(|| args.next())
                    .ok_or_else(|| ClientError::Usage(format!("{flag} needs a value")))
            };
            match flag.as_str() {
                "--config" => parsed.config = Some(PathBuf::from(value()?)),
                "--query" => parsed.query = value()?,
                "--pages" => {
                    let raw = value()?;
                    parsed.pages = raw
                        .parse()
                        .ok()
                        .filter(|pages| *pages > 0)
                        .ok_or_else(|| {
                            ClientError::Usage(format!("--pages expects a positive number, got {raw}"))
                        })?;
                }
                other => return Err(ClientError::Usage(format!("unknown argument {other}"))),
            }
        }
        Ok(parsed)
    }
}
