use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 输入校验失败（在任何远程调用之前）
    #[error("输入无效: {0}")]
    InvalidInput(#[from] InputError),
    /// 单个文件的评分失败，最终会折叠为 `GradeOutcome::Failure`
    #[error("{0}")]
    Grading(#[from] GradingError),
    /// 结果文件写入失败
    #[error("写入结果文件失败 ({path}): {source}")]
    Persistence {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文档转换失败
    #[error("文档转换失败 ({path}): {message}")]
    Conversion { path: String, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    /// 其他错误（用于包装第三方库错误）
    #[error("{0:#}")]
    Other(#[from] anyhow::Error),
}

/// 输入校验错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("请提供 Gemini API Key")]
    MissingCredential,
    #[error("提交目录不存在或不是目录: {path}")]
    InvalidDirectory { path: String },
    #[error("请提供题目描述（评分标准）")]
    BlankRubric,
    #[error("没有可重试的结果")]
    EmptyTable,
    #[error("无效的行号 {index}（共 {len} 行）")]
    RowOutOfRange { index: usize, len: usize },
}

/// 评分流程中的错误，每一种都对应一个失败的评分结果
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GradingError {
    #[error("上传失败: {0}")]
    Upload(String),
    #[error("远程文件处理失败: {0}")]
    Processing(String),
    #[error("等待远程文件处理超时 ({secs} 秒)")]
    PollTimeout { secs: u64 },
    #[error("模型调用失败: {0}")]
    Generate(String),
    #[error("无法解析模型响应，原始内容: {raw}")]
    Parse { raw: String },
    #[error("评分模型返回了空结果列表")]
    EmptyResult,
    #[error("远程服务错误: {0}")]
    Remote(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件读取失败
    #[error("无法读取配置文件 {path}: {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 配置文件解析失败
    #[error("无法解析配置文件 {path}: {source}")]
    FileParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建结果文件写入错误
    pub fn persistence(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Persistence {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// 创建文档转换错误
    pub fn conversion(path: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Conversion {
            path: path.into(),
            message: message.into(),
        }
    }

    /// 是否属于输入校验错误（这类错误应在开始前直接终止）
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, AppError::InvalidInput(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
