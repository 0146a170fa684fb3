use crate::models::DEFAULT_CURRENCY;
use anyhow::{anyhow, bail, Context};
use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct LedgerConfig {
    pub data_dir: PathBuf,
    pub default_currency: String,
    /// Choices offered by the currency picker. Other codes are still accepted.
    pub currencies: Vec<String>,
}

/// Per-user data directory (`$XDG_DATA_HOME/loanbook`, `~/Library/Application Support/loanbook`, ...).
pub fn default_data_dir() -> anyhow::Result<PathBuf> {
    dirs::data_dir()
        .ok_or(anyhow!("can't determine data dir"))
        .map(|d| d.join("loanbook"))
}

impl LedgerConfig {
    /// `LOANBOOK_DATA_DIR` wins over the per-user data directory.
    pub fn from_env() -> anyhow::Result<Self> {
        let data_dir = match env::var("LOANBOOK_DATA_DIR") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => default_data_dir().context("LOANBOOK_DATA_DIR is not set")?,
        };
        let defaults = Self::with_data_dir(&data_dir);
        let default_currency = env::var("LOANBOOK_DEFAULT_CURRENCY")
            .map(|c| c.trim().to_uppercase())
            .unwrap_or(defaults.default_currency);
        let currencies = match env::var("LOANBOOK_CURRENCIES") {
            Ok(list) => parse_currency_list(&list).context("LOANBOOK_CURRENCIES")?,
            Err(_) => defaults.currencies,
        };
        let config = Self {
            data_dir,
            default_currency,
            currencies,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            default_currency: DEFAULT_CURRENCY.to_string(),
            currencies: vec!["UAH".to_string(), "USD".to_string(), "EUR".to_string()],
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.default_currency.trim().is_empty() {
            bail!("default currency must not be empty");
        }
        if self.currencies.is_empty() {
            bail!("at least one currency must be offered");
        }
        Ok(())
    }
}

/// Comma-separated codes, e.g. `"UAH, usd,EUR"`.
pub fn parse_currency_list(list: &str) -> anyhow::Result<Vec<String>> {
    let codes: Vec<String> = list
        .split(',')
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .collect();
    if codes.is_empty() {
        bail!("no currency codes in {:?}", list);
    }
    Ok(codes)
}
