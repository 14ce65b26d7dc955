/// 题目来源
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionSource {
    /// 本地 TOML 题目文件
    Fixtures,
    /// 按分类从考试后端拉取
    Http,
}

impl QuestionSource {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "fixtures" => Some(QuestionSource::Fixtures),
            "http" => Some(QuestionSource::Http),
            _ => None,
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 题目来源（本地文件或后端接口）
    pub question_source: QuestionSource,
    /// 考试服务 API 地址
    pub exam_api_base_url: String,
    /// 本地题目 TOML 文件存放目录（离线排练模式）
    pub fixture_folder: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 排练模式下模拟音频的时间压缩倍率（1 = 真实时长）
    pub rehearsal_time_scale: u32,
    /// 网络请求超时（秒）
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            question_source: QuestionSource::Fixtures,
            exam_api_base_url: "http://localhost:5000".to_string(),
            fixture_folder: "fixtures".to_string(),
            verbose_logging: false,
            output_log_file: "session.txt".to_string(),
            rehearsal_time_scale: 10,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            question_source: std::env::var("QUESTION_SOURCE").ok().and_then(|v| QuestionSource::parse(&v)).unwrap_or(default.question_source),
            exam_api_base_url: std::env::var("EXAM_API_BASE_URL").unwrap_or(default.exam_api_base_url),
            fixture_folder: std::env::var("FIXTURE_FOLDER").unwrap_or(default.fixture_folder),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            rehearsal_time_scale: std::env::var("REHEARSAL_TIME_SCALE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.rehearsal_time_scale),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
        }
    }
}
