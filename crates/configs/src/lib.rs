use std::str::FromStr;

use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Directory holding the pre-built single-page frontend.
    #[serde(default = "default_frontend_dir")]
    pub frontend_dir: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
            worker_threads: Some(4),
            frontend_dir: default_frontend_dir(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_frontend_dir() -> String { "frontend".into() }
fn default_request_timeout() -> u64 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 5 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_hours: i64,
    /// Optional administrator created at startup when the email is unknown.
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: default_jwt_secret(), token_ttl_hours: default_token_ttl(), bootstrap_admin: None }
    }
}

fn default_jwt_secret() -> String { "dev-secret-change-me".into() }
fn default_token_ttl() -> i64 { 168 }

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Which data backend the store activates at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Probe the database once; fall back to the seeded in-memory store.
    #[default]
    Auto,
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(StoreBackend::Auto),
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow!("unknown store.backend `{other}` (expect auto|postgres|memory)")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Seed sample users and services into the in-memory store.
    #[serde(default = "default_seed")]
    pub seed_sample_data: bool,
}

impl Default for StoreConfig {
    fn default() -> Self { Self { backend: StoreBackend::Auto, seed_sample_data: true } }
}

fn default_seed() -> bool { true }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`); a missing file yields defaults.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.apply_env();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Environment variables take precedence over the file.
    pub fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(backend) = std::env::var("STORE_BACKEND").ok().and_then(|b| b.parse().ok()) {
            self.store.backend = backend;
        }
        self.database.normalize_from_env();
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 归一化 server
        self.server.normalize()?;
        self.auth.validate()?;
        // 仅在强制使用 Postgres 时要求 URL
        if self.store.backend == StoreBackend::Postgres || !self.database.url.trim().is_empty() {
            self.database.validate()?;
        }
        Ok(())
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port 必须在 1..=65535 范围内"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = default_request_timeout();
        }
        Ok(())
    }
}

impl AuthConfig {
    fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret 不能为空"));
        }
        if self.token_ttl_hours <= 0 {
            return Err(anyhow!("auth.token_ttl_hours 必须为正整数"));
        }
        if let Some(admin) = &self.bootstrap_admin {
            if !admin.email.contains('@') || admin.password.len() < 6 {
                return Err(anyhow!("auth.bootstrap_admin 需要有效邮箱与至少 6 位密码"));
            }
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        // 若 TOML 中未提供 URL，则尝试从环境变量填充
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    /// Whether a connection string is configured at all.
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url 为空；请在 config.toml 或环境变量 DATABASE_URL 中提供"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url 必须以 postgresql:// 或 postgres:// 开头"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections 必须 >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections 必须 >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database 超时配置必须为正整数秒"));
        }
        Ok(())
    }
}
