use serde::Deserialize;
use std::path::PathBuf;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub server_name: String,
    pub root_dir: PathBuf,
    pub bind_addr: String,
    pub rest_port: u16,
    pub max_upload_mb: u64,
    /// Lower-cased, dot-prefixed. Empty means every extension is accepted.
    pub allowed_extensions: Vec<String>,
    pub case_sensitive_paths: bool,
    pub static_dir: Option<PathBuf>,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            server_name: std::env::var("SERVER_NAME")
                .unwrap_or_else(|_| "fsgate".to_string()),
            root_dir: std::env::var("ROOT_DIR")
                .unwrap_or_else(|_| "./Uploads".to_string())
                .into(),
            bind_addr: std::env::var("BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            rest_port: std::env::var("REST_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            max_upload_mb: std::env::var("MAX_UPLOAD_MB")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,
            allowed_extensions: parse_extensions(
                &std::env::var("ALLOWED_EXTENSIONS").unwrap_or_default(),
            ),
            case_sensitive_paths: match std::env::var("CASE_SENSITIVE_PATHS") {
                Ok(v) => parse_bool(&v)?,
                Err(_) => host_is_case_sensitive(),
            },
            static_dir: std::env::var("STATIC_DIR")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:7146".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }

    /// Configuration rooted at `root_dir` with every other field at its default.
    #[cfg(test)]
    pub fn for_root(root_dir: impl Into<PathBuf>) -> Self {
        Config {
            server_name: "fsgate".to_string(),
            root_dir: root_dir.into(),
            bind_addr: "127.0.0.1".to_string(),
            rest_port: 0,
            max_upload_mb: 100,
            allowed_extensions: Vec::new(),
            case_sensitive_paths: host_is_case_sensitive(),
            static_dir: None,
            cors_origins: Vec::new(),
        }
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

/// Windows and macOS default to case-insensitive filesystems.
pub fn host_is_case_sensitive() -> bool {
    !cfg!(any(windows, target_os = "macos"))
}

/// Normalise a comma-separated extension list to `.ext` lower-case form.
pub fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .map(|s| format!(".{}", s))
        .collect()
}

fn parse_bool(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("CASE_SENSITIVE_PATHS must be true or false, got {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extensions() {
        assert_eq!(
            parse_extensions(" .TXT, pdf ,,.Md"),
            vec![".txt".to_string(), ".pdf".to_string(), ".md".to_string()]
        );
        assert!(parse_extensions("").is_empty());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("TRUE").unwrap());
        assert!(!parse_bool("off").unwrap());
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_max_upload_bytes() {
        let mut config = Config::for_root("/tmp");
        config.max_upload_mb = 2;
        assert_eq!(config.max_upload_bytes(), 2 * 1024 * 1024);
    }
}
