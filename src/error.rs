use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 存储层错误
    Store(StoreError),
    /// 输入校验错误
    Validation(ValidationError),
    /// LLM 服务错误
    Llm(LlmError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Store(e) => write!(f, "存储错误: {}", e),
            AppError::Validation(e) => write!(f, "校验错误: {}", e),
            AppError::Llm(e) => write!(f, "LLM错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Store(e) => Some(e),
            AppError::Validation(e) => Some(e),
            AppError::Llm(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 存储层错误
#[derive(Debug)]
pub enum StoreError {
    /// 问题不存在
    NotFound {
        id: String,
    },
    /// 问题已存在
    AlreadyExists {
        id: String,
    },
    /// 并发写入冲突（重试次数耗尽）
    Conflict {
        id: String,
        attempts: usize,
    },
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// JSON 解析失败
    JsonParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound { id } => write!(f, "问题不存在: {}", id),
            StoreError::AlreadyExists { id } => write!(f, "问题已存在: {}", id),
            StoreError::Conflict { id, attempts } => {
                write!(f, "并发写入冲突 (问题: {}, 已重试 {} 次)", id, attempts)
            }
            StoreError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            StoreError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
            StoreError::JsonParseFailed { path, source } => {
                write!(f, "JSON解析失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::ReadFailed { source, .. }
            | StoreError::WriteFailed { source, .. }
            | StoreError::JsonParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 输入校验错误
#[derive(Debug)]
pub enum ValidationError {
    /// 问题内容为空
    EmptyQuestionContent,
    /// 回答词数不足
    AnswerTooShort {
        words: usize,
        min_words: usize,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyQuestionContent => write!(f, "问题内容不能为空"),
            ValidationError::AnswerTooShort { words, min_words } => {
                write!(f, "回答词数不足: {} 词 (至少需要 {} 词)", words, min_words)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// LLM 服务错误
#[derive(Debug)]
pub enum LlmError {
    /// API 调用失败
    ApiCallFailed {
        model: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 调用超时
    Timeout {
        model: String,
        seconds: u64,
    },
    /// 返回内容为空
    EmptyContent {
        model: String,
    },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::ApiCallFailed { model, source } => {
                write!(f, "LLM API调用失败 (模型: {}): {}", model, source)
            }
            LlmError::Timeout { model, seconds } => {
                write!(f, "LLM 调用超时 (模型: {}, 超时: {}秒)", model, seconds)
            }
            LlmError::EmptyContent { model } => {
                write!(f, "LLM返回内容为空 (模型: {})", model)
            }
        }
    }
}

impl std::error::Error for LlmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LlmError::ApiCallFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

// ========== 从常见错误类型转换 ==========
// 注意：不需要手动实现 From<AppError> for anyhow::Error，
// 因为 anyhow 已经为所有实现了 std::error::Error 的类型提供了自动实现

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Store(StoreError::JsonParseFailed {
            path: String::new(), // serde_json 错误通常不包含路径信息
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Store(StoreError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建问题不存在错误
    pub fn not_found(id: impl Into<String>) -> Self {
        AppError::Store(StoreError::NotFound { id: id.into() })
    }

    /// 创建问题已存在错误
    pub fn already_exists(id: impl Into<String>) -> Self {
        AppError::Store(StoreError::AlreadyExists { id: id.into() })
    }

    /// 创建并发冲突错误
    pub fn conflict(id: impl Into<String>, attempts: usize) -> Self {
        AppError::Store(StoreError::Conflict {
            id: id.into(),
            attempts,
        })
    }

    /// 创建文件读取错误
    pub fn read_failed(path: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::Store(StoreError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn write_failed(path: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::Store(StoreError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建 JSON 解析错误
    pub fn json_parse_failed(path: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::Store(StoreError::JsonParseFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建回答词数不足错误
    pub fn answer_too_short(words: usize, min_words: usize) -> Self {
        AppError::Validation(ValidationError::AnswerTooShort { words, min_words })
    }

    /// 创建LLM API调用错误
    pub fn llm_api_failed(model: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::Llm(LlmError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }

    /// 创建LLM超时错误
    pub fn llm_timeout(model: impl Into<String>, seconds: u64) -> Self {
        AppError::Llm(LlmError::Timeout {
            model: model.into(),
            seconds,
        })
    }
}

// ========== 错误分类判断 ==========

impl AppError {
    /// 是否为"问题不存在"错误
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::Store(StoreError::NotFound { .. }))
    }

    /// 是否为输入校验错误
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }

    /// 是否为"分析报告暂不可用"类错误（LLM 调用失败或超时）
    pub fn is_synthesis_unavailable(&self) -> bool {
        matches!(self, AppError::Llm(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
