//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `PLANNER__*` 覆盖（双下划线表示嵌套，如 `PLANNER__AUTH__SECRET=...`），
//! 最后兼容旧部署的环境变量名（SECRET_KEY / GITHUB_TOKEN / GITHUB_USERNAME / PORT）。
//! 启动时加载一次，之后只读，按引用传给各组件。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub auth: AuthSection,
    pub planning: PlanningSection,
    pub pipeline: PipelineSection,
    pub publishing: PublishingSection,
    pub users: UsersSection,
}

/// [server] 段：监听地址
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// [auth] 段：签名密钥与令牌有效期
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    /// 未设置时启动生成随机密钥（重启后旧令牌全部失效）
    pub secret: Option<String>,
    pub token_ttl_hours: i64,
}

/// 令牌有效期上限：一年
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

impl AuthSection {
    /// 有效期落在 (0, MAX_TOKEN_TTL_HOURS] 内时返回
    pub fn token_ttl(&self) -> Option<chrono::Duration> {
        if self.token_ttl_hours <= 0 || self.token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            return None;
        }
        chrono::Duration::try_hours(self.token_ttl_hours)
    }
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            secret: None,
            token_ttl_hours: 24,
        }
    }
}

/// [planning] 段：请求缺省值
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlanningSection {
    pub default_sprint_length_days: u32,
    pub default_sprint_capacity_points: u32,
    /// 成员缺名时的占位前缀，实际名字为 "{placeholder} {序号}"
    pub member_placeholder: String,
    /// 原样转发给管线
    pub max_validation_attempts: u32,
}

impl Default for PlanningSection {
    fn default() -> Self {
        Self {
            default_sprint_length_days: 2,
            default_sprint_capacity_points: 20,
            member_placeholder: "Member".to_string(),
            max_validation_attempts: 1,
        }
    }
}

/// [pipeline] 段：外部规划管线地址；未配置时使用内置 Echo 管线
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PipelineSection {
    pub endpoint: Option<String>,
}

/// [publishing] 段：看板发布集成（凭据与账号同时存在才会调用）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublishingSection {
    pub credential: Option<String>,
    pub account: Option<String>,
    pub endpoint: Option<String>,
    /// 仅作用于发布调用
    pub timeout_secs: u64,
}

impl Default for PublishingSection {
    fn default() -> Self {
        Self {
            credential: None,
            account: None,
            endpoint: None,
            timeout_secs: 30,
        }
    }
}

impl PublishingSection {
    /// 凭据与账号均非空时返回 (credential, account)
    pub fn eligible(&self) -> Option<(&str, &str)> {
        let credential = self.credential.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let account = self.account.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some((credential, account))
    }

    /// 去空白后非空的发布地址
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// 成员没有外部账号时使用的默认账号（可能为空串）
    pub fn default_handle(&self) -> String {
        self.account.as_deref().unwrap_or_default().trim().to_string()
    }
}

/// [users] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UsersSection {
    /// 空库时写入演示账号 testuser / test@example.com / test123
    pub seed_demo_user: bool,
}

impl Default for UsersSection {
    fn default() -> Self {
        Self {
            seed_demo_user: true,
        }
    }
}

/// 旧部署使用的环境变量名 -> 配置键
const LEGACY_ENV_KEYS: [(&str, &str); 4] = [
    ("SECRET_KEY", "auth.secret"),
    ("GITHUB_TOKEN", "publishing.credential"),
    ("GITHUB_USERNAME", "publishing.account"),
    ("PORT", "server.port"),
];

/// 从 config 目录加载配置，环境变量 PLANNER__* 与旧变量名可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 叠加环境变量 PLANNER__*（双下划线表示嵌套键）
/// 4. 最后应用 LEGACY_ENV_KEYS 中已设置的变量
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("PLANNER")
            .separator("__")
            .try_parsing(true),
    );

    for (var, key) in LEGACY_ENV_KEYS {
        let value = std::env::var(var).ok().filter(|v| !v.trim().is_empty());
        builder = builder.set_override_option(key, value)?;
    }

    let c = builder.build()?;
    let cfg: AppConfig = c.try_deserialize()?;
    validate(&cfg)?;
    Ok(cfg)
}

/// 启动时拒绝会让运行期出错的取值
fn validate(cfg: &AppConfig) -> Result<(), config::ConfigError> {
    if cfg.auth.token_ttl().is_none() {
        return Err(config::ConfigError::Message(format!(
            "auth.token_ttl_hours must be between 1 and {}, got {}",
            MAX_TOKEN_TTL_HOURS, cfg.auth.token_ttl_hours
        )));
    }
    Ok(())
}

/// 配置文件路径：PLANNER_CONFIG 环境变量
pub fn config_path_from_env() -> Option<PathBuf> {
    std::env::var_os("PLANNER_CONFIG").map(PathBuf::from)
}
