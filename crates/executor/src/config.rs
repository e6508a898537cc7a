use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use engine::{RiskSettings, SymbolAliases};
use market_data::remote::DEFAULT_BRIDGE_URL;
use scheduler::{ScheduleWindow, WeekTime};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            key,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// External commands for the fetch / send / parse steps. Unset steps are skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowCommands {
    pub fetch: Option<String>,
    pub send: Option<String>,
    pub parse: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub window: ScheduleWindow,
    pub start_in_minutes: i64,
    pub run_on_start: bool,
    pub risk: RiskSettings,
    pub aliases: SymbolAliases,
    pub signals_dir: PathBuf,
    pub run_log: PathBuf,
    pub account_name: Option<String>,
    pub bridge_url: String,
    pub bridge_token: Option<String>,
    pub workflow: WorkflowCommands,
    pub telegram: Option<TelegramConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let interval: u32 = parse_or(&get, "INTERVAL_MINUTES", 30)?;
        let start = week_time(&get, ("START_DAY", "mon"), ("START_TIME", "08:10"))?;
        let stop = week_time(&get, ("STOP_DAY", "fri"), ("STOP_TIME", "23:35"))?;
        let window = ScheduleWindow::new(interval, start, stop)
            .map_err(|e| ConfigError::invalid("INTERVAL_MINUTES", &interval.to_string(), e))?;

        let start_in_minutes: i64 = parse_or(&get, "START_IN_MINUTES", 0)?;
        if start_in_minutes < 0 {
            return Err(ConfigError::invalid(
                "START_IN_MINUTES",
                &start_in_minutes.to_string(),
                "must not be negative",
            ));
        }

        let risk = RiskSettings {
            risk_per_trade: parse_opt(&get, "RISK_PER_TRADE")?,
            max_risk_per_trade: parse_opt(&get, "MAX_RISK_PER_TRADE")?,
        };

        let aliases = match get("SYMBOL_ALIASES") {
            Some(raw) => SymbolAliases::builtin().with_overrides(parse_aliases(&raw)?),
            None => SymbolAliases::builtin(),
        };

        Ok(Self {
            window,
            start_in_minutes,
            run_on_start: parse_bool(&get, "RUN_ON_START", true)?,
            risk,
            aliases,
            signals_dir: get("SIGNALS_DIR")
                .unwrap_or_else(|| "data/live_trade/signals/signals_json".to_string())
                .into(),
            run_log: get("RUN_LOG")
                .unwrap_or_else(|| "logs/run.log".to_string())
                .into(),
            account_name: get("ACCOUNT_NAME"),
            bridge_url: get("BRIDGE_URL").unwrap_or_else(|| DEFAULT_BRIDGE_URL.to_string()),
            bridge_token: get("BRIDGE_TOKEN"),
            workflow: WorkflowCommands {
                fetch: get("FETCH_CMD"),
                send: get("SEND_CMD"),
                parse: get("PARSE_CMD"),
            },
            telegram: telegram(&get)?,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
    G: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(get, key)?.unwrap_or(default))
}

fn parse_opt<T, G>(get: &G, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| raw.parse::<T>().map_err(|e| ConfigError::invalid(key, &raw, e)))
        .transpose()
}

fn parse_bool<G>(get: &G, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::invalid(key, &raw, "expected true or false")),
        },
    }
}

fn week_time<G>(
    get: &G,
    (day_key, day_default): (&'static str, &str),
    (time_key, time_default): (&'static str, &str),
) -> Result<WeekTime, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let day = get(day_key).unwrap_or_else(|| day_default.to_string());
    let time = get(time_key).unwrap_or_else(|| time_default.to_string());

    let day_idx = scheduler::window::parse_day(&day).map_err(|e| ConfigError::invalid(day_key, &day, e))?;
    let at = scheduler::window::parse_time(&time).map_err(|e| ConfigError::invalid(time_key, &time, e))?;
    WeekTime::new(day_idx, at).map_err(|e| ConfigError::invalid(day_key, &day, e))
}

/// `XAUUSD=XAUUSDm,BTCUSD=BTCUSDc`
fn parse_aliases(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((base, broker)) if !base.trim().is_empty() && !broker.trim().is_empty() => {
                Ok((base.trim().to_string(), broker.trim().to_string()))
            }
            _ => Err(ConfigError::invalid("SYMBOL_ALIASES", pair, "expected BASE=BROKER")),
        })
        .collect()
}

fn telegram<G>(get: &G) -> Result<Option<TelegramConfig>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match (get("TELEGRAM_BOT_TOKEN"), get("TELEGRAM_CHAT_ID")) {
        (Some(token), Some(chat_id)) => {
            let chat_id = chat_id
                .parse::<i64>()
                .map_err(|e| ConfigError::invalid("TELEGRAM_CHAT_ID", &chat_id, e))?;
            Ok(Some(TelegramConfig { token, chat_id }))
        }
        (None, None) => Ok(None),
        _ => {
            warn!("Telegram needs both TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID; notifications disabled");
            Ok(None)
        }
    }
}
