use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 题目序列错误
    Sequence(SequenceError),
    /// 录音资源错误
    Capture(CaptureError),
    /// 音频播放错误
    Playback(PlaybackError),
    /// 成绩提交错误
    Submission(SubmissionError),
    /// 配置错误
    Config(ConfigError),
    /// 本地题目文件错误
    Fixture(FixtureError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Sequence(e) => write!(f, "题目序列错误: {}", e),
            AppError::Capture(e) => write!(f, "录音资源错误: {}", e),
            AppError::Playback(e) => write!(f, "音频播放错误: {}", e),
            AppError::Submission(e) => write!(f, "成绩提交错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Fixture(e) => write!(f, "题目文件错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Sequence(e) => Some(e),
            AppError::Capture(e) => Some(e),
            AppError::Playback(e) => Some(e),
            AppError::Submission(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Fixture(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 题目序列错误
///
/// 致命错误：序列为空时禁止进入考试引擎，调用方应回到选择页面
#[derive(Debug)]
pub enum SequenceError {
    /// 所有分类合并后题目为空
    Empty,
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceError::Empty => write!(f, "没有可用的题目，无法开始考试"),
        }
    }
}

impl std::error::Error for SequenceError {}

/// 录音资源错误
///
/// PermissionDenied / DeviceUnavailable 对整场考试非致命：
/// 状态机把答案记为空并继续推进。AlreadyLive 属于编程错误，防御性拒绝。
#[derive(Debug)]
pub enum CaptureError {
    /// 平台拒绝了麦克风权限
    PermissionDenied,
    /// 没有可用的录音设备
    DeviceUnavailable {
        detail: String,
    },
    /// 已存在活跃的录音句柄（全局最多一个）
    AlreadyLive,
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::PermissionDenied => write!(f, "麦克风权限被拒绝"),
            CaptureError::DeviceUnavailable { detail } => {
                write!(f, "录音设备不可用: {}", detail)
            }
            CaptureError::AlreadyLive => {
                write!(f, "已存在活跃的录音句柄，获取新句柄前必须先释放")
            }
        }
    }
}

impl std::error::Error for CaptureError {}

/// 音频播放错误
///
/// 播放失败视为立即播放完成，考试流程绝不会卡在这里等待
#[derive(Debug)]
pub enum PlaybackError {
    /// 音频加载或播放失败
    PlayFailed {
        url: String,
        detail: String,
    },
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackError::PlayFailed { url, detail } => {
                write!(f, "音频播放失败 ({}): {}", url, detail)
            }
        }
    }
}

impl std::error::Error for PlaybackError {}

/// 成绩提交错误
///
/// 考试已经结束，静默重复提交会导致成绩重复计入，
/// 因此提交失败后不做自动重试，只向用户提供手动重试入口
#[derive(Debug)]
pub enum SubmissionError {
    /// 网络请求失败
    RequestFailed {
        endpoint: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 服务端返回错误响应
    BadResponse {
        endpoint: String,
        status: Option<u16>,
        message: Option<String>,
    },
    /// 响应 JSON 解析失败
    JsonParseFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionError::RequestFailed { endpoint, source } => {
                write!(f, "提交请求失败 ({}): {}", endpoint, source)
            }
            SubmissionError::BadResponse {
                endpoint,
                status,
                message,
            } => {
                write!(
                    f,
                    "服务端返回错误响应 ({}): status={:?}, message={:?}",
                    endpoint, status, message
                )
            }
            SubmissionError::JsonParseFailed { source } => {
                write!(f, "JSON解析失败: {}", source)
            }
        }
    }
}

impl std::error::Error for SubmissionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SubmissionError::RequestFailed { source, .. }
            | SubmissionError::JsonParseFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 环境变量解析失败
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => {
                write!(
                    f,
                    "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
                    var_name, value, expected_type
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// 本地题目文件错误
#[derive(Debug)]
pub enum FixtureError {
    /// 文件不存在
    NotFound {
        path: String,
    },
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    TomlParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for FixtureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixtureError::NotFound { path } => write!(f, "文件不存在: {}", path),
            FixtureError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FixtureError::TomlParseFailed { path, source } => {
                write!(f, "TOML解析失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for FixtureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FixtureError::ReadFailed { source, .. }
            | FixtureError::TomlParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

// ========== 从常见错误类型转换 ==========
// 注意：不需要手动实现 From<AppError> for anyhow::Error，
// 因为 anyhow 已经为所有实现了 std::error::Error 的类型提供了自动实现

impl From<SequenceError> for AppError {
    fn from(err: SequenceError) -> Self {
        AppError::Sequence(err)
    }
}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<PlaybackError> for AppError {
    fn from(err: PlaybackError) -> Self {
        AppError::Playback(err)
    }
}

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        AppError::Submission(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Submission(SubmissionError::JsonParseFailed {
            source: Box::new(err),
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Fixture(FixtureError::TomlParseFailed {
            path: String::new(), // TOML错误通常不包含路径信息
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Fixture(FixtureError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
