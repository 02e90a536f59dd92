//! CLI + environment configuration resolution.
//!
//! Precedence, for every knob: explicit CLI flag > `LOGDY_*` environment
//! variable > built-in default. This mirrors the original's
//! `getStringCfgVal`/`getBoolCfgVal`/`getIntCfgVal` chain, but resolved once
//! at startup into one immutable [`Config`] rather than re-read per call.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "logdy", version, about = "In-memory log streaming hub")]
pub struct Cli {
    #[command(subcommand)]
    pub source: Option<SourceCommand>,

    #[arg(long)]
    pub server_port: Option<u16>,
    #[arg(long, value_parser = parse_server_ip)]
    pub server_ip: Option<String>,
    #[arg(long)]
    pub ui_pass: Option<String>,
    #[arg(long)]
    pub api_key: Option<String>,
    #[arg(long)]
    pub config_file_path: Option<String>,
    #[arg(long)]
    pub http_path_prefix: Option<String>,
    #[arg(long)]
    pub bulk_window_ms: Option<u64>,
    #[arg(long)]
    pub max_message_count: Option<u64>,
    #[arg(long)]
    pub append_to_file: Option<String>,
    #[arg(long)]
    pub append_to_file_raw: bool,
    #[arg(long)]
    pub append_to_file_rotate_max_size: Option<String>,
    #[arg(long)]
    pub analytics_disabled: bool,
    #[arg(long)]
    pub fallthrough: bool,
    #[arg(long)]
    pub disable_ansi_code_stripping: bool,
}

/// Which live source feeds the engine, if any. Absent means the server runs
/// headless apart from `POST /api/log` and whatever the UI sends.
#[derive(Debug, Clone, clap::Subcommand)]
pub enum SourceCommand {
    /// Read raw lines from this process's own stdin.
    Stdin,
    /// Spawn a child process and stream its stdout/stderr.
    Exec {
        /// Program and arguments, e.g. `logdy exec -- npm run dev`.
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,
    },
    /// Listen on a TCP port for newline-delimited text.
    Tcp {
        #[arg(value_parser = logdy_sources::validate::is_port)]
        port: u16,
    },
    /// Tail a file, following appended lines.
    Tail {
        #[arg(value_parser = logdy_sources::validate::is_file)]
        path: String,
        #[arg(long)]
        from_beginning: bool,
    },
    /// Emit synthetic log lines for smoke-testing the UI.
    Demo {
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub server_ip: String,
    pub ui_pass: String,
    pub api_key: String,
    pub config_file_path: String,
    pub http_path_prefix: String,
    pub bulk_window_ms: u64,
    pub max_message_count: u64,
    pub append_to_file: Option<PathBuf>,
    pub append_to_file_raw: bool,
    pub append_to_file_rotate_max_size: Option<u64>,
    pub analytics_disabled: bool,
    pub fallthrough: bool,
    pub disable_ansi_code_stripping: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn parse_server_ip(raw: &str) -> Result<String, String> {
    logdy_sources::validate::is_ip_addr(raw).map(|ip| ip.to_string())
}

fn resolve_string(cli: Option<String>, env_key: &str, default: &str) -> String {
    cli.filter(|v| !v.is_empty())
        .or_else(|| std::env::var(env_key).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| default.to_owned())
}

fn resolve_u64(cli: Option<u64>, env_key: &str, default: u64) -> Result<u64, ConfigError> {
    if let Some(v) = cli {
        return Ok(v);
    }
    match std::env::var(env_key) {
        Ok(v) if !v.is_empty() => v.parse().map_err(|_| ConfigError::Invalid {
            field: "integer",
            reason: format!("'{v}' is not a valid integer"),
        }),
        _ => Ok(default),
    }
}

fn resolve_bool(cli: bool, env_key: &str) -> bool {
    cli || std::env::var(env_key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn normalize_path_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else {
        format!("/{trimmed}/")
    }
}

/// Parse a size string like `10M`, `500K`, or a bare `1024` (bytes).
pub fn parse_byte_size(raw: &str) -> Result<u64, ConfigError> {
    let raw = raw.trim();
    let invalid = || ConfigError::Invalid {
        field: "append_to_file_rotate_max_size",
        reason: format!("'{raw}' does not match \\d+[KMGT]?"),
    };
    if raw.is_empty() {
        return Err(invalid());
    }
    let (digits, multiplier) = match raw.chars().last().unwrap() {
        'K' | 'k' => (&raw[..raw.len() - 1], 1024u64),
        'M' | 'm' => (&raw[..raw.len() - 1], 1024 * 1024),
        'G' | 'g' => (&raw[..raw.len() - 1], 1024 * 1024 * 1024),
        'T' | 't' => (&raw[..raw.len() - 1], 1024 * 1024 * 1024 * 1024),
        '0'..='9' => (raw, 1),
        _ => return Err(invalid()),
    };
    let count: u64 = digits.parse().map_err(|_| invalid())?;
    Ok(count * multiplier)
}

impl Config {
    pub fn resolve(cli: Cli) -> Result<Self, ConfigError> {
        let max_message_count = resolve_u64(cli.max_message_count, "LOGDY_MAX_MESSAGE_COUNT", 100_000)?;
        let max_message_count = if max_message_count == 0 { 100_000 } else { max_message_count };

        let append_to_file_rotate_max_size = match cli
            .append_to_file_rotate_max_size
            .or_else(|| std::env::var("LOGDY_APPEND_TO_FILE_ROTATE_MAX_SIZE").ok())
        {
            Some(raw) if !raw.is_empty() => Some(parse_byte_size(&raw)?),
            _ => None,
        };

        Ok(Self {
            server_port: resolve_u64(cli.server_port.map(u64::from), "LOGDY_SERVER_PORT", 8080)? as u16,
            server_ip: resolve_string(cli.server_ip, "LOGDY_SERVER_IP", "127.0.0.1"),
            ui_pass: resolve_string(cli.ui_pass, "LOGDY_UI_PASS", ""),
            api_key: resolve_string(cli.api_key, "LOGDY_API_KEY", ""),
            config_file_path: resolve_string(cli.config_file_path, "LOGDY_CONFIG_FILE_PATH", ""),
            http_path_prefix: normalize_path_prefix(&resolve_string(
                cli.http_path_prefix,
                "LOGDY_HTTP_PATH_PREFIX",
                "/",
            )),
            bulk_window_ms: resolve_u64(cli.bulk_window_ms, "LOGDY_BULK_WINDOW_MS", 100)?,
            max_message_count,
            append_to_file: {
                let raw = resolve_string(cli.append_to_file, "LOGDY_APPEND_TO_FILE", "");
                if raw.is_empty() { None } else { Some(PathBuf::from(raw)) }
            },
            append_to_file_raw: resolve_bool(cli.append_to_file_raw, "LOGDY_APPEND_TO_FILE_RAW"),
            append_to_file_rotate_max_size,
            analytics_disabled: resolve_bool(cli.analytics_disabled, "LOGDY_ANALYTICS_DISABLED"),
            fallthrough: resolve_bool(cli.fallthrough, "LOGDY_FALLTHROUGH"),
            disable_ansi_code_stripping: resolve_bool(
                cli.disable_ansi_code_stripping,
                "LOGDY_DISABLE_ANSI_CODE_STRIPPING",
            ),
        })
    }
}
