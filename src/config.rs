use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::FixedOffset;
use thiserror::Error;

use crate::domain::pricing::{BracketRateTable, FixedRateConverter};

/// EMS rates bundled with the binary, used when `RATE_TABLE_PATH` is unset.
pub const BUNDLED_RATE_TABLE: &str = include_str!("../config/ems_rates.json");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has invalid value '{value}': {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Rate table could not be loaded from {path}: {reason}")]
    RateTable { path: String, reason: String },
}

/// Runtime settings read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` selects the in-memory storage.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub rate_table_path: Option<PathBuf>,
    pub exchange_rate_krw_per_jpy: BigDecimal,
    pub conversion_rounding_unit: i64,
    pub auto_confirm_payment: bool,
    pub order_number_offset: FixedOffset,
    pub quotation_dir: PathBuf,
    pub slack_webhook_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Blank values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let offset_hours: i32 = parse_or(&get, "ORDER_NUMBER_UTC_OFFSET_HOURS", 9)?;
        let order_number_offset = FixedOffset::east_opt(offset_hours * 3600).ok_or_else(|| {
            ConfigError::InvalidValue {
                key: "ORDER_NUMBER_UTC_OFFSET_HOURS",
                value: offset_hours.to_string(),
                reason: "offset must be within ±23 hours".to_string(),
            }
        })?;

        let conversion_rounding_unit = parse_or(&get, "CONVERSION_ROUNDING_UNIT", 10i64)?;
        if conversion_rounding_unit <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "CONVERSION_ROUNDING_UNIT",
                value: conversion_rounding_unit.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        // 9.4 KRW per JPY
        let exchange_rate_krw_per_jpy =
            parse_or(&get, "EXCHANGE_RATE_KRW_PER_JPY", BigDecimal::new(94.into(), 1))?;

        let auto_confirm_payment = match get("AUTO_CONFIRM_PAYMENT") {
            None => true,
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: "AUTO_CONFIRM_PAYMENT",
                value: raw.clone(),
                reason: "expected true or false".to_string(),
            })?,
        };

        Ok(Self {
            database_url: get("DATABASE_URL"),
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "PORT", 8080u16)?,
            rate_table_path: get("RATE_TABLE_PATH").map(PathBuf::from),
            exchange_rate_krw_per_jpy,
            conversion_rounding_unit,
            auto_confirm_payment,
            order_number_offset,
            quotation_dir: get("QUOTATION_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("quotations")),
            slack_webhook_url: get("SLACK_WEBHOOK_URL"),
        })
    }

    pub fn load_rate_table(&self) -> Result<BracketRateTable, ConfigError> {
        let (source, json) = match &self.rate_table_path {
            Some(path) => {
                let json = fs::read_to_string(path).map_err(|e| ConfigError::RateTable {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                (path.display().to_string(), json)
            }
            None => ("<bundled>".to_string(), BUNDLED_RATE_TABLE.to_string()),
        };
        BracketRateTable::from_json(&json).map_err(|e| ConfigError::RateTable {
            path: source,
            reason: e.to_string(),
        })
    }

    pub fn converter(&self) -> Result<FixedRateConverter, ConfigError> {
        FixedRateConverter::new(
            self.exchange_rate_krw_per_jpy.clone(),
            self.conversion_rounding_unit,
        )
        .map_err(|e| ConfigError::InvalidValue {
            key: "EXCHANGE_RATE_KRW_PER_JPY",
            value: self.exchange_rate_krw_per_jpy.to_string(),
            reason: e.to_string(),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            reason: e.to_string(),
            value: raw,
        }),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
