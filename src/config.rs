use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

const DEFAULTS: &str = include_str!("../config/default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    pub root_dir: PathBuf,
    pub block_size: ByteSize,
    pub thread_count: Option<usize>,
    pub follow_symlinks: bool,
    pub excludes: Vec<String>,
    pub max_batch_size: usize,
}

impl FilesConfig {
    /// Worker count for batch operations: the configured value, or the CPU
    /// count with a floor of 2.
    pub fn effective_thread_count(&self) -> usize {
        match self.thread_count {
            Some(n) if n > 0 => n,
            _ => num_cpus::get().max(2),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum TokenAlgorithm {
    #[default]
    #[serde(rename = "EdDSA", alias = "eddsa")]
    EdDsa,
    #[serde(rename = "HS256", alias = "hs256")]
    Hs256,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default)]
    pub allowed_audiences: Vec<String>,
    #[serde(default)]
    pub allowed_subjects: Vec<String>,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    #[serde(default)]
    pub algorithm: TokenAlgorithm,
    pub secret: Option<String>,
    pub private_key_path: Option<PathBuf>,
    pub public_key_path: Option<PathBuf>,
}

fn default_issuer() -> String {
    "project-atlas".to_string()
}

fn default_token_ttl_secs() -> u64 {
    3600
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SecurityConfig {
    pub enable_hsts: Option<bool>,
    pub hsts_max_age: Option<u64>,
    pub hsts_include_subdomains: Option<bool>,
    pub csp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub files: FilesConfig,
    pub logging: LoggingConfig,
    pub auth: Option<AuthConfig>,
    pub security: Option<SecurityConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        // Fallback: parse the embedded default TOML
        match ::config::Config::builder()
            .add_source(::config::File::from_str(DEFAULTS, ::config::FileFormat::Toml))
            .build()
        {
            Ok(cfg) => match cfg.try_deserialize() {
                Ok(app_cfg) => app_cfg,
                Err(e) => panic!("Failed to deserialize default config: {}", e),
            },
            Err(e) => panic!("Failed to parse default config: {}", e),
        }
    }
}

/// A byte count that deserializes from either an integer or a human readable
/// string such as `"128 MiB"` or `"64KB"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ByteSize(pub u64);

impl ByteSize {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
        let mut value = self.0 as f64;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }
        if unit == 0 {
            write!(f, "{}B", self.0)
        } else {
            write!(f, "{:.1}{}", value, UNITS[unit])
        }
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u64),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Ok(ByteSize(n)),
            Raw::Text(s) => parse_byte_size(&s).map(ByteSize).map_err(serde::de::Error::custom),
        }
    }
}

/// Parses `"<number> <unit>"`. Decimal units (KB, MB, GB, TB) are powers of
/// 1000, binary units (KiB, MiB, GiB, TiB) powers of 1024; unit case is ignored.
pub fn parse_byte_size(input: &str) -> Result<u64, String> {
    let s = input.trim();
    let split = s.find(|c: char| !(c.is_ascii_digit() || c == '.')).unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    let number: f64 = number
        .parse()
        .map_err(|_| format!("invalid byte size '{}': expected a number", input))?;
    let multiplier: u64 = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" => 1_000,
        "m" | "mb" => 1_000_000,
        "g" | "gb" => 1_000_000_000,
        "t" | "tb" => 1_000_000_000_000,
        "kib" => 1 << 10,
        "mib" => 1 << 20,
        "gib" => 1 << 30,
        "tib" => 1 << 40,
        other => return Err(format!("invalid byte size '{}': unknown unit '{}'", input, other)),
    };
    let bytes = number * multiplier as f64;
    if !bytes.is_finite() || bytes > u64::MAX as f64 {
        return Err(format!("invalid byte size '{}': out of range", input));
    }
    Ok(bytes as u64)
}

/// Loads the configuration: embedded defaults, then `atlas-files.toml` in the
/// working directory, then the file named by `ATLAS_FILES_CONFIG`, then
/// `ATLAS_FILES__<SECTION>__<KEY>` environment variables.
pub fn load() -> anyhow::Result<AppConfig> {
    // Load .env first (optional)
    let _ = dotenvy::dotenv();

    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from_str(DEFAULTS, ::config::FileFormat::Toml))
        .add_source(::config::File::with_name("atlas-files").required(false));

    if let Ok(custom_path) = std::env::var("ATLAS_FILES_CONFIG") {
        builder = builder.add_source(::config::File::with_name(&custom_path).required(false));
    }
    // Environment variables last to have highest precedence
    builder = builder.add_source(
        ::config::Environment::with_prefix("ATLAS_FILES")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("files.excludes")
            .with_list_parse_key("auth.allowed_audiences")
            .with_list_parse_key("auth.allowed_subjects"),
    );

    let app_cfg: AppConfig = builder.build()?.try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

/// Layers a TOML document over the embedded defaults and validates the result.
pub fn from_toml_str(toml: &str) -> anyhow::Result<AppConfig> {
    let app_cfg: AppConfig = ::config::Config::builder()
        .add_source(::config::File::from_str(DEFAULTS, ::config::FileFormat::Toml))
        .add_source(::config::File::from_str(toml, ::config::FileFormat::Toml))
        .build()?
        .try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

pub fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    // Server
    if cfg.server.port == 0 {
        return Err(anyhow::anyhow!("invalid server.port: {}", cfg.server.port));
    }

    // Files
    let root = &cfg.files.root_dir;
    if !root.is_dir() {
        return Err(anyhow::anyhow!(
            "files.root_dir must be an existing directory: {}",
            root.display()
        ));
    }
    if cfg.files.block_size.as_u64() == 0 {
        return Err(anyhow::anyhow!("files.block_size must be > 0"));
    }
    if let Some(n) = cfg.files.thread_count {
        if n == 0 || n > 256 {
            return Err(anyhow::anyhow!("files.thread_count must be in 1..=256"));
        }
    }
    if cfg.files.max_batch_size == 0 {
        return Err(anyhow::anyhow!("files.max_batch_size must be > 0"));
    }
    for pattern in &cfg.files.excludes {
        globset::Glob::new(&pattern.trim().replace('\\', "/"))
            .map_err(|e| anyhow::anyhow!("invalid files.excludes pattern '{}': {}", pattern, e))?;
    }

    // Auth
    if let Some(auth) = &cfg.auth {
        if auth.issuer.trim().is_empty() {
            return Err(anyhow::anyhow!("auth.issuer must not be empty"));
        }
        if auth.token_ttl_secs == 0 {
            return Err(anyhow::anyhow!("auth.token_ttl_secs must be > 0"));
        }
        match auth.algorithm {
            TokenAlgorithm::Hs256 => {
                if auth.secret.as_deref().map_or(true, |s| s.is_empty()) {
                    return Err(anyhow::anyhow!("auth.secret is required for HS256"));
                }
            }
            TokenAlgorithm::EdDsa => {
                if auth.private_key_path.is_none() || auth.public_key_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "auth.private_key_path and auth.public_key_path are required for EdDSA"
                    ));
                }
            }
        }
    }

    Ok(())
}

/// Logs the effective settings once logging is up.
pub fn report(cfg: &AppConfig) {
    #[cfg(unix)]
    if cfg.server.port < 1024 {
        tracing::warn!("Using privileged port {} - may require elevated permissions", cfg.server.port);
    }
    tracing::info!("Files directory: {}", display_dir(&cfg.files.root_dir));
    tracing::info!("Hashing block size: {}", cfg.files.block_size);
    if cfg.files.thread_count.is_none() {
        tracing::info!("No thread count configured, using detected CPU count");
    }
    tracing::info!("Operations thread count: {}", cfg.files.effective_thread_count());
    match &cfg.auth {
        Some(auth) => tracing::info!("Token authentication enabled (issuer '{}')", auth.issuer),
        None => tracing::warn!("No [auth] section configured - /files endpoints are NOT authenticated"),
    }
}

fn display_dir(path: &Path) -> String {
    let s = path.display().to_string();
    if s.ends_with('/') {
        s
    } else {
        format!("{}/", s)
    }
}
