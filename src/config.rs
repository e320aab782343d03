use crate::error::{AppResult, ConfigError};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- Gemini 配置 ---
    pub gemini_api_key: String,
    pub gemini_api_base_url: String,
    pub gemini_model_name: String,
    /// nucleus sampling 阈值
    pub top_p: f32,
    pub temperature: f32,
    /// 思考预算，-1 表示不限制
    pub thinking_budget: i32,
    /// 单次 HTTP 请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 轮询配置 ---
    pub poll_interval_secs: u64,
    pub poll_timeout_secs: u64,
    // --- 批处理配置 ---
    /// 默认的文件扩展名列表（逗号分隔）
    pub default_extensions: String,
    /// 调试日志文件（只追加）
    pub debug_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 文档转换配置 ---
    /// 转换程序路径，未设置时在 PATH 中查找 soffice / libreoffice
    pub converter_program: Option<String>,
    pub conversion_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            gemini_api_base_url: "https://generativelanguage.googleapis.com".to_string(),
            gemini_model_name: "gemini-2.5-flash".to_string(),
            top_p: 0.5,
            temperature: 0.5,
            thinking_budget: -1,
            request_timeout_secs: 120,
            poll_interval_secs: 2,
            poll_timeout_secs: 300,
            default_extensions: ".pdf, .py, .txt".to_string(),
            debug_log_file: "debug.log".to_string(),
            verbose_logging: false,
            converter_program: None,
            conversion_timeout_secs: 180,
        }
    }
}

impl Config {
    /// 默认值 + 环境变量
    pub fn from_env() -> AppResult<Self> {
        Self::default().apply_env()
    }

    /// 默认值 → 配置文件（可选）→ 环境变量
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.apply_env()
    }

    /// 从 TOML 文件加载，未出现的字段使用默认值
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| {
            ConfigError::FileParseFailed {
                path: path.display().to_string(),
                source,
            }
            .into()
        })
    }

    fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 用环境变量覆盖当前配置
    pub fn apply_env(self) -> AppResult<Self> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    fn apply_vars(mut self, var: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        if let Some(v) = var("GEMINI_API_KEY") {
            self.gemini_api_key = v;
        }
        if let Some(v) = var("GEMINI_API_BASE_URL") {
            self.gemini_api_base_url = v;
        }
        if let Some(v) = var("GEMINI_MODEL_NAME") {
            self.gemini_model_name = v;
        }
        parse_var(&var, "GEMINI_TOP_P", "f32", &mut self.top_p)?;
        parse_var(&var, "GEMINI_TEMPERATURE", "f32", &mut self.temperature)?;
        parse_var(&var, "GEMINI_THINKING_BUDGET", "i32", &mut self.thinking_budget)?;
        parse_var(&var, "REQUEST_TIMEOUT_SECS", "u64", &mut self.request_timeout_secs)?;
        parse_var(&var, "POLL_INTERVAL_SECS", "u64", &mut self.poll_interval_secs)?;
        parse_var(&var, "POLL_TIMEOUT_SECS", "u64", &mut self.poll_timeout_secs)?;
        if let Some(v) = var("DEFAULT_EXTENSIONS") {
            self.default_extensions = v;
        }
        if let Some(v) = var("DEBUG_LOG_FILE") {
            self.debug_log_file = v;
        }
        parse_var(&var, "VERBOSE_LOGGING", "bool", &mut self.verbose_logging)?;
        if let Some(v) = var("CONVERTER_PROGRAM") {
            self.converter_program = Some(v);
        }
        parse_var(
            &var,
            "CONVERSION_TIMEOUT_SECS",
            "u64",
            &mut self.conversion_timeout_secs,
        )?;
        Ok(self)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn conversion_timeout(&self) -> Duration {
        Duration::from_secs(self.conversion_timeout_secs)
    }
}

fn parse_var<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
    expected_type: &str,
    target: &mut T,
) -> AppResult<()> {
    if let Some(value) = var(name) {
        *target = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: name.to_string(),
                value: value.clone(),
                expected_type: expected_type.to_string(),
            })?;
    }
    Ok(())
}
