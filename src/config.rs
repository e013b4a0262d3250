use crate::error::ConfigError;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 待处理试卷文件目录
    pub input_folder: String,
    /// 同步后的提交数据输出目录
    pub output_folder: String,
    /// 同时处理的试卷数量
    pub max_concurrent_bundles: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    // --- 后端 API 配置 ---
    pub api_base_url: String,
    pub api_token: String,
    // --- 听力录音分段 ---
    pub questions_per_recording: u32,
    pub max_recordings: usize,
    /// 考试倒计时间隔（毫秒）
    pub exam_tick_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_folder: "input_tests".to_string(),
            output_folder: "output_payloads".to_string(),
            max_concurrent_bundles: 8,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            api_base_url: "http://localhost:8080/api".to_string(),
            api_token: String::new(),
            questions_per_recording: 10,
            max_recordings: 4,
            exam_tick_ms: 1000,
        }
    }
}

/// 读取并解析环境变量，不存在时返回默认值
fn parse_env<T: FromStr>(var_name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value,
            expected_type: std::any::type_name::<T>().to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// 读取环境变量，解析失败时记录警告并使用默认值
fn env_or<T: FromStr + Clone>(var_name: &str, default: T) -> T {
    parse_env(var_name, default.clone()).unwrap_or_else(|e| {
        warn!("⚠️ {}，使用默认值", e);
        default
    })
}

impl Config {
    /// 从环境变量加载配置，解析失败的项使用默认值
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            input_folder: std::env::var("INPUT_FOLDER").unwrap_or(default.input_folder),
            output_folder: std::env::var("OUTPUT_FOLDER").unwrap_or(default.output_folder),
            max_concurrent_bundles: env_or("MAX_CONCURRENT_BUNDLES", default.max_concurrent_bundles),
            verbose_logging: env_or("VERBOSE_LOGGING", default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            api_base_url: std::env::var("API_BASE_URL").unwrap_or(default.api_base_url),
            api_token: std::env::var("API_TOKEN").unwrap_or(default.api_token),
            questions_per_recording: env_or("QUESTIONS_PER_RECORDING", default.questions_per_recording),
            max_recordings: env_or("MAX_RECORDINGS", default.max_recordings),
            exam_tick_ms: env_or("EXAM_TICK_MS", default.exam_tick_ms),
        }
    }

    /// 考试倒计时刷新间隔
    pub fn exam_tick(&self) -> Duration {
        Duration::from_millis(self.exam_tick_ms)
    }

    /// 从环境变量加载配置，任何一项解析失败都返回错误
    pub fn try_from_env() -> Result<Self, ConfigError> {
        let default = Self::default();
        Ok(Self {
            input_folder: parse_env("INPUT_FOLDER", default.input_folder)?,
            output_folder: parse_env("OUTPUT_FOLDER", default.output_folder)?,
            max_concurrent_bundles: parse_env(
                "MAX_CONCURRENT_BUNDLES",
                default.max_concurrent_bundles,
            )?,
            verbose_logging: parse_env("VERBOSE_LOGGING", default.verbose_logging)?,
            output_log_file: parse_env("OUTPUT_LOG_FILE", default.output_log_file)?,
            api_base_url: parse_env("API_BASE_URL", default.api_base_url)?,
            api_token: parse_env("API_TOKEN", default.api_token)?,
            questions_per_recording: parse_env(
                "QUESTIONS_PER_RECORDING",
                default.questions_per_recording,
            )?,
            max_recordings: parse_env("MAX_RECORDINGS", default.max_recordings)?,
            exam_tick_ms: parse_env("EXAM_TICK_MS", default.exam_tick_ms)?,
        })
    }
}
