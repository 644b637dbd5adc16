use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub recording: RecordingConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RecordingConfig {
    pub max_concurrent: usize,
    /// Carried as data for an external scheduler; nothing in this service
    /// enforces it.
    pub timeout_ms: u64,
    /// Same as `timeout_ms`: data for an external periodic collaborator.
    pub cleanup_interval_ms: u64,
    pub encoder_path: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub recordings_path: PathBuf,
    pub temp_path: PathBuf,
    pub max_file_age_days: u64,
    pub max_disk_usage_gb: u64,
}

impl ServiceConfig {
    fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env_or("HOST", "0.0.0.0"),
                port: env_parse("PORT", 3001),
            },
            cors: CorsConfig {
                origins: parse_origins(&env_or(
                    "CORS_ORIGINS",
                    "http://localhost:3000,http://localhost:8080",
                )),
            },
            recording: RecordingConfig {
                max_concurrent: env_parse("MAX_CONCURRENT_RECORDINGS", 5),
                timeout_ms: env_parse("RECORDING_TIMEOUT", 3_600_000),
                cleanup_interval_ms: env_parse("CLEANUP_INTERVAL", 300_000),
                encoder_path: env_or("FFMPEG_PATH", "ffmpeg"),
            },
            storage: StorageConfig {
                recordings_path: PathBuf::from(env_or("RECORDINGS_PATH", "./recordings")),
                temp_path: PathBuf::from(env_or("TEMP_PATH", "./temp")),
                max_file_age_days: env_parse("MAX_FILE_AGE_DAYS", 30),
                max_disk_usage_gb: env_parse("MAX_DISK_USAGE_GB", 50),
            },
        }
    }
}

pub fn config() -> &'static ServiceConfig {
    static CONFIG: LazyLock<ServiceConfig> = LazyLock::new(ServiceConfig::from_env);
    &CONFIG
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_parse_falls_back_to_default() {
        assert_eq!(env_parse("RECORDD_UNSET_TEST_KEY", 42u64), 42);
    }

    #[test]
    fn test_parse_origins_splits_and_trims() {
        let origins = parse_origins("http://a:3000, http://b:8080 ,");
        assert_eq!(origins, vec!["http://a:3000", "http://b:8080"]);
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_env();
        assert!(config.recording.max_concurrent >= 1);
        assert!(!config.recording.encoder_path.is_empty());
        assert!(!config.storage.recordings_path.as_os_str().is_empty());
    }
}
