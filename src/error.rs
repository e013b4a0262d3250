use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 编辑/作答会话错误
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// 上下文模板错误
    #[error("模板错误: {0}")]
    Template(#[from] TemplateError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 编辑/作答会话错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// 题组不存在
    #[error("题组不存在: {set_id}")]
    SetNotFound { set_id: String },
    /// 题目不存在
    #[error("题组 {set_id} 中不存在题目 {question_id}")]
    QuestionNotFound { set_id: String, question_id: String },
    /// 试卷中不存在该题目
    #[error("试卷 {test_id} 中不存在题目 {question_id}")]
    QuestionNotInTest { test_id: i64, question_id: String },
    /// 序号超出当前列表范围
    #[error("{list} 序号 {ordinal} 超出范围 [1, {len}]")]
    OrdinalOutOfRange {
        list: &'static str,
        ordinal: usize,
        len: usize,
    },
    /// 试卷已提交
    #[error("试卷已提交")]
    AlreadySubmitted,
}

/// 上下文模板错误
///
/// 只有模板完全无法使用时才会出现，个别占位符找不到题目不算错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// 模板中没有任何占位符
    #[error("题组 {set_name} 的模板中没有占位符 (结构化表格解析失败: {malformed})")]
    NoPlaceholders { set_name: String, malformed: bool },
    /// 所有占位符都找不到对应题目
    #[error("题组 {set_name} 的占位符 {numbers:?} 都找不到对应题目")]
    NoneResolved { set_name: String, numbers: Vec<u32> },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
    /// 不支持的文件格式
    #[error("不支持的文件格式: {path}")]
    UnsupportedExtension { path: String },
    /// 试卷不存在
    #[error("试卷不存在: {test_id}")]
    TestNotFound { test_id: i64 },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// API 返回错误状态
    #[error("API返回错误响应 ({endpoint}): status={status}")]
    BadStatus { endpoint: String, status: u16 },
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
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Other(format!("JSON解析失败: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: err,
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建API请求失败错误
    pub fn api_request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        AppError::Api(ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
