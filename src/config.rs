use std::path::PathBuf;
use std::time::Duration;

use crate::client::ClientConfig;
use crate::error::{Error, Result};

#[derive(Debug, Default, PartialEq)]
pub(crate) struct RcConfig {
    rest_url: Option<String>,
    wcs_url: Option<String>,
    timeout: Option<String>,
    verify: Option<String>,
    progress: Option<String>,
}

pub(crate) fn load_config() -> Result<ClientConfig> {
    let mut rc = None;
    for rc_path in rc_candidates() {
        if rc_path.exists() {
            let text =
                std::fs::read_to_string(&rc_path).map_err(|e| Error::io(&rc_path, e))?;
            rc = Some(parse_rc(&text));
            break;
        }
    }
    resolve(|name| std::env::var(name).ok(), rc)
}

/// Environment first, then the rc file, then the public defaults.
pub(crate) fn resolve<F>(env: F, rc: Option<RcConfig>) -> Result<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let rc = rc.unwrap_or_default();
    let mut cfg = ClientConfig::default();

    if let Some(url) = env("SOILGRIDS_REST_URL").or(rc.rest_url) {
        cfg.rest_url = url;
    }
    if let Some(url) = env("SOILGRIDS_WCS_URL").or(rc.wcs_url) {
        cfg.wcs_url = url;
    }
    if let Some(t) = env("SOILGRIDS_TIMEOUT").or(rc.timeout) {
        cfg.timeout = parse_timeout(&t)?;
    }
    if let Some(v) = rc.verify {
        cfg.verify = parse_flag("verify", &v)?;
    }
    if let Some(v) = rc.progress {
        cfg.progress = parse_flag("progress", &v)?;
    }

    Ok(cfg)
}

fn parse_timeout(s: &str) -> Result<Duration> {
    let secs: f64 = s
        .trim()
        .parse()
        .map_err(|_| Error::invalid("timeout", format!("'{s}' is not a number of seconds")))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(Error::invalid("timeout", format!("'{s}' must be a positive number of seconds")));
    }
    Ok(Duration::from_secs_f64(secs))
}

fn parse_flag(field: &'static str, s: &str) -> Result<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::invalid(field, format!("'{other}' is not a boolean"))),
    }
}

pub(crate) fn parse_rc(text: &str) -> RcConfig {
    let mut cfg = RcConfig::default();

    // Support formatting where `rest_url:` is on one line and the value on the next.
    let mut pending_key: Option<String> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(pk) = pending_key.take() {
            // Continuation value line. URLs contain a colon, so only a known
            // key prefix starts a new entry.
            if !starts_with_key(line) {
                set(&mut cfg, &pk, strip_quotes(line));
                continue;
            }
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            if v.is_empty() {
                pending_key = Some(k.to_string());
            } else {
                set(&mut cfg, k, v);
            }
        }
    }

    cfg
}

const KEYS: [&str; 5] = ["rest_url", "wcs_url", "timeout", "verify", "progress"];

fn starts_with_key(line: &str) -> bool {
    line.split_once(':')
        .is_some_and(|(k, _)| KEYS.contains(&k.trim()))
}

fn set(cfg: &mut RcConfig, key: &str, value: &str) {
    let value = Some(value.to_string());
    match key {
        "rest_url" => cfg.rest_url = value,
        "wcs_url" => cfg.wcs_url = value,
        "timeout" => cfg.timeout = value,
        "verify" => cfg.verify = value,
        "progress" => cfg.progress = value,
        _ => {}
    }
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // 1) SOILGRIDS_RC (explicit)
    // 2) ./.soilgridsrc
    // 3) ~/.soilgridsrc
    if let Ok(p) = std::env::var("SOILGRIDS_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".soilgridsrc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".soilgridsrc"));
    }
    v.dedup();
    v
}
