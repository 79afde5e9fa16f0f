mod capture_config;
#[allow(clippy::module_inception)]
mod config;
mod logging_config;
mod server_config;
mod storage_config;
mod upload_config;

pub(crate) use {
    capture_config::CaptureConfig, config::Config, logging_config::LoggingConfig,
    server_config::ServerConfig, storage_config::StorageConfig, upload_config::UploadConfig,
};

pub(crate) const DEFAULT_PORT: u16 = 7878;
pub(crate) const DEFAULT_FINALIZE_TIMEOUT_MS: u64 = 10_000;
pub(crate) const DEFAULT_TICK_MS: u64 = 500;
pub(crate) const DEFAULT_FAILURE_THRESHOLD_MIN: u32 = 30;
pub(crate) const DEFAULT_FAILURE_THRESHOLD_MAX: u32 = 89;
pub(crate) const DEFAULT_STEP_MIN: u32 = 3;
pub(crate) const DEFAULT_STEP_MAX: u32 = 12;
pub(crate) const DEFAULT_LOG_FILTER: &str = "clip_recorder=info,clip_recorder_core=info";

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_port() -> u16 {
    DEFAULT_PORT
}

pub(crate) fn default_finalize_timeout_ms() -> u64 {
    DEFAULT_FINALIZE_TIMEOUT_MS
}

pub(crate) fn default_tick_ms() -> u64 {
    DEFAULT_TICK_MS
}

pub(crate) fn default_failure_threshold_min() -> u32 {
    DEFAULT_FAILURE_THRESHOLD_MIN
}

pub(crate) fn default_failure_threshold_max() -> u32 {
    DEFAULT_FAILURE_THRESHOLD_MAX
}

pub(crate) fn default_step_min() -> u32 {
    DEFAULT_STEP_MIN
}

pub(crate) fn default_step_max() -> u32 {
    DEFAULT_STEP_MAX
}

pub(crate) fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}
