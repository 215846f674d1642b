use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MESSAGE_LIMIT: usize = 4096;

/// Typed process configuration, read once at startup.
#[derive(Clone)]
pub struct Config {
    // Credentials
    pub telegram_bot_token: String,
    pub gemini_api_key: String,

    // Model
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub query_timeout: Option<Duration>,

    // Telegram limits
    pub telegram_message_limit: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("telegram_bot_token", &"<redacted>")
            .field("gemini_api_key", &"<redacted>")
            .field("gemini_model", &self.gemini_model)
            .field("gemini_api_base", &self.gemini_api_base)
            .field("query_timeout", &self.query_timeout)
            .field("telegram_message_limit", &self.telegram_message_limit)
            .finish()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (env in production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).and_then(non_empty);

        let telegram_bot_token = var("TOKEN_API")
            .or_else(|| var("TELEGRAM_BOT_TOKEN"))
            .ok_or_else(|| {
                Error::Config("TOKEN_API environment variable is required".to_string())
            })?;
        let gemini_api_key = var("GEMINI_API_KEY").ok_or_else(|| {
            Error::Config("GEMINI_API_KEY environment variable is required".to_string())
        })?;

        let gemini_model = var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let gemini_api_base = var("GEMINI_API_BASE")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string());

        let query_timeout = match var("QUERY_TIMEOUT_MS") {
            Some(raw) => Some(parse_millis("QUERY_TIMEOUT_MS", &raw)?),
            None => None,
        };

        let telegram_message_limit = match var("TELEGRAM_MESSAGE_LIMIT") {
            Some(raw) => parse_usize("TELEGRAM_MESSAGE_LIMIT", &raw)?.clamp(200, 4096),
            None => DEFAULT_MESSAGE_LIMIT,
        };

        Ok(Self {
            telegram_bot_token,
            gemini_api_key,
            gemini_model,
            gemini_api_base,
            query_timeout,
            telegram_message_limit,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_millis(key: &str, raw: &str) -> Result<Duration> {
    let ms = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{key} must be a number of milliseconds, got {raw:?}")))?;
    if ms == 0 {
        return Err(Error::Config(format!("{key} must be greater than zero")));
    }
    Ok(Duration::from_millis(ms))
}

fn parse_usize(key: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| Error::Config(format!("{key} must be a positive integer, got {raw:?}")))
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |k| map.get(k).map(|v| v.to_string())
    }

    #[test]
    fn loads_required_and_defaults() {
        let cfg = Config::from_lookup(lookup(&[("TOKEN_API", "123:abc"), ("GEMINI_API_KEY", "g")]))
            .unwrap();
        assert_eq!(cfg.telegram_bot_token, "123:abc");
        assert_eq!(cfg.gemini_api_key, "g");
        assert_eq!(cfg.gemini_model, DEFAULT_MODEL);
        assert_eq!(cfg.gemini_api_base, DEFAULT_GEMINI_API_BASE);
        assert_eq!(cfg.query_timeout, None);
        assert_eq!(cfg.telegram_message_limit, 4096);
    }

    #[test]
    fn telegram_bot_token_is_accepted_as_alias() {
        let cfg = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "42:xyz"),
            ("GEMINI_API_KEY", "g"),
        ]))
        .unwrap();
        assert_eq!(cfg.telegram_bot_token, "42:xyz");
    }

    #[test]
    fn missing_credentials_are_config_errors() {
        let err = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "g")])).unwrap_err();
        assert!(err.to_string().contains("TOKEN_API"));

        let err = Config::from_lookup(lookup(&[("TOKEN_API", "1:a"), ("GEMINI_API_KEY", "  ")]))
            .unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn parses_optional_overrides() {
        let cfg = Config::from_lookup(lookup(&[
            ("TOKEN_API", "1:a"),
            ("GEMINI_API_KEY", "g"),
            ("GEMINI_MODEL", "gemini-1.5-pro"),
            ("GEMINI_API_BASE", "http://127.0.0.1:9999/"),
            ("QUERY_TIMEOUT_MS", "2500"),
            ("TELEGRAM_MESSAGE_LIMIT", "10"),
        ]))
        .unwrap();
        assert_eq!(cfg.gemini_model, "gemini-1.5-pro");
        assert_eq!(cfg.gemini_api_base, "http://127.0.0.1:9999");
        assert_eq!(cfg.query_timeout, Some(Duration::from_millis(2500)));
        assert_eq!(cfg.telegram_message_limit, 200);
    }

    #[test]
    fn rejects_bad_timeout() {
        let err = Config::from_lookup(lookup(&[
            ("TOKEN_API", "1:a"),
            ("GEMINI_API_KEY", "g"),
            ("QUERY_TIMEOUT_MS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let cfg = Config::from_lookup(lookup(&[("TOKEN_API", "1:secret"), ("GEMINI_API_KEY", "k3y")]))
            .unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("secret"));
        assert!(!dbg.contains("k3y"));
    }

    #[test]
    fn dotenv_parsing_strips_quotes_and_comments() {
        let parsed = parse_dotenv(
            "# comment\nTOKEN_API=\"1:abc\"\nexport GEMINI_API_KEY='xyz'\n\nBROKEN\n=nokey\n",
        );
        assert_eq!(
            parsed,
            vec![
                ("TOKEN_API".to_string(), "1:abc".to_string()),
                ("GEMINI_API_KEY".to_string(), "xyz".to_string()),
            ]
        );
    }
}
