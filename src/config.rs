//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，环境变量 `API_KEY`、`UPSTREAM_BASE_URL` 优先于文件

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::services::poller::PollSettings;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API Key（为空则不启用认证）
    #[serde(default)]
    pub api_key: String,
    /// 请求分析服务的超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 分析服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// 分析服务基础地址，如 http://localhost:5000/api
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// 实时价格配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    /// 轮询间隔（秒）
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// 价格变动高亮时长（毫秒）
    #[serde(default = "default_flash_millis")]
    pub flash_millis: u64,
    /// 连续失败多少次后停止轮询（0 表示一直重试）
    #[serde(default)]
    pub max_poll_failures: u32,
    /// 每连续失败多少次输出一条警告（0 表示不输出）
    #[serde(default = "default_warn_every")]
    pub warn_every_failures: u32,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// API 配置
    #[serde(default)]
    pub api: ApiConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
    /// 分析服务配置
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// 实时价格配置
    #[serde(default)]
    pub live: LiveConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_log_level() -> String { "info".to_string() }
fn default_base_url() -> String { "http://localhost:5000/api".to_string() }
fn default_poll_interval() -> u64 { 5 }
fn default_flash_millis() -> u64 { 1000 }
fn default_warn_every() -> u32 { 12 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            flash_millis: default_flash_millis(),
            max_poll_failures: 0,
            warn_every_failures: default_warn_every(),
        }
    }
}

/// 配置加载经过，日志初始化之后再输出
#[derive(Debug, Default)]
pub struct LoadReport {
    /// 成功加载的配置文件，None 表示使用默认配置
    pub source: Option<String>,
    /// 加载失败的配置文件及原因
    pub failures: Vec<(String, String)>,
    /// 来自环境变量的分析服务地址
    pub upstream_from_env: Option<String>,
}

impl LoadReport {
    pub fn log(&self) {
        for (path, reason) in &self.failures {
            log::warn!("加载配置文件 {} 失败: {}", path, reason);
        }
        match &self.source {
            Some(path) => log::info!("从 {} 加载配置成功", path),
            None => log::info!("使用默认配置"),
        }
        if let Some(url) = &self.upstream_from_env {
            log::info!("使用环境变量中的分析服务地址: {}", url);
        }
    }
}

impl LiveConfig {
    /// 转换为轮询参数，间隔至少 1 秒
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            flash: Duration::from_millis(self.flash_millis),
            max_failures: self.max_poll_failures,
            warn_every: self.warn_every_failures,
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值；最后应用环境变量覆盖
    ///
    /// 此时日志尚未初始化，加载经过记录在 `LoadReport` 中
    pub fn load() -> (Self, LoadReport) {
        let mut report = LoadReport::default();
        let mut config = Self::load_file(&["config.json", "config/config.json"], &mut report);
        report.upstream_from_env = config.apply_env(
            env::var("API_KEY").ok(),
            env::var("UPSTREAM_BASE_URL").ok(),
        );
        (config, report)
    }

    fn load_file(config_paths: &[&str], report: &mut LoadReport) -> Self {
        for path in config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        report.source = Some(path.to_string());
                        return config;
                    }
                    Err(e) => {
                        report.failures.push((path.to_string(), e.to_string()));
                    }
                }
            }
        }

        Self::default()
    }

    /// 环境变量覆盖，空值忽略；返回生效的分析服务地址
    pub fn apply_env(&mut self, api_key: Option<String>, base_url: Option<String>) -> Option<String> {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.api.api_key = key;
        }
        let url = base_url.filter(|u| !u.trim().is_empty())?;
        self.upstream.base_url = url.clone();
        Some(url)
    }

    /// 校验配置
    pub fn validate(&self) -> anyhow::Result<()> {
        let url = Url::parse(&self.upstream.base_url)
            .map_err(|e| anyhow::anyhow!("分析服务地址无效 {}: {}", self.upstream.base_url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("分析服务地址必须是 http/https: {}", url);
        }
        if self.live.poll_interval_secs == 0 {
            log::warn!("轮询间隔为 0，按 1 秒处理");
        }
        Ok(())
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.api.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{"server": {"port": 9090}, "live": {"max_poll_failures": 20}}"#,
        )
        .unwrap();

        assert_eq!(config.bind_addr(), "0.0.0.0:9090");
        assert_eq!(config.upstream.base_url, "http://localhost:5000/api");
        assert_eq!(config.live.poll_interval_secs, 5);
        assert_eq!(config.live.max_poll_failures, 20);
        assert_eq!(config.live.warn_every_failures, 12);
        assert!(config.api.api_key.is_empty());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        let url = config.apply_env(Some("secret".to_string()), Some("http://10.0.0.5:5000/api".to_string()));
        assert_eq!(url.as_deref(), Some("http://10.0.0.5:5000/api"));
        assert_eq!(config.api.api_key, "secret");
        assert_eq!(config.upstream.base_url, "http://10.0.0.5:5000/api");

        assert!(config.apply_env(Some("  ".to_string()), None).is_none());
        assert_eq!(config.api.api_key, "secret");
    }

    #[test]
    fn test_broken_file_is_reported() {
        println!("\n========== 测试配置文件损坏时记录失败原因 ==========");
        let dir = std::env::temp_dir().join(format!("stock-dashboard-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let broken = dir.join("broken.json");
        let good = dir.join("good.json");
        fs::write(&broken, "{ not json").unwrap();
        fs::write(&good, r#"{"api": {"api_key": "k"}}"#).unwrap();

        let broken_path = broken.to_string_lossy().to_string();
        let good_path = good.to_string_lossy().to_string();

        let mut report = LoadReport::default();
        let config = AppConfig::load_file(&[broken_path.as_str()], &mut report);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, broken_path);
        assert!(report.source.is_none());
        assert!(config.api.api_key.is_empty());

        let mut report = LoadReport::default();
        let config = AppConfig::load_file(&[broken_path.as_str(), good_path.as_str()], &mut report);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.source.as_deref(), Some(good_path.as_str()));
        assert_eq!(config.api.api_key, "k");

        fs::remove_dir_all(&dir).unwrap();
        println!("✅ 配置加载记录测试通过！");
    }

    #[test]
    fn test_validate_upstream_url() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.upstream.base_url = "ftp://example.com/api".to_string();
        assert!(config.validate().is_err());

        config.upstream.base_url = "localhost:5000".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_poll_settings() {
        let live = LiveConfig {
            poll_interval_secs: 0,
            ..Default::default()
        };
        let settings = live.poll_settings();
        assert_eq!(settings.interval, Duration::from_secs(1));
        assert_eq!(settings.flash, Duration::from_millis(1000));
    }
}
