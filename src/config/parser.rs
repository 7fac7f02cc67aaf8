use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Reads a crawl configuration file and checks it
///
/// Missing tables and keys fall back to their defaults, so an empty file is
/// a valid configuration. The start URL may be left out here and supplied on
/// the command line instead.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use gov_scraper::config::load_config;
///
/// let config = load_config(Path::new("crawl.toml")).unwrap();
/// println!("Max depth: {}", config.crawler.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    parse_config(&std::fs::read_to_string(path)?)
}

/// Parses and validates configuration text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Hex-encoded SHA-256 of the configuration file as stored on disk
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    Ok(hash_content(&std::fs::read_to_string(path)?))
}

/// Loads a configuration along with the hash of the text it was parsed from
///
/// The file is read once, so the hash always matches the settings returned.
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, hash_content(&content)))
}

fn hash_content(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[crawler]
start-url = "https://gov.example/"
max-depth = 2
max-pages = 50
delay = 0.25
workers = 4
keep-query = true

[user-agent]
crawler-name = "TestCrawler"
crawler-version = "1.0"
contact-url = "https://example.com/about"

[output]
stats-path = "out/stats.csv"
errors-path = "out/errors.csv"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.start_url.as_deref(), Some("https://gov.example/"));
        assert_eq!(config.crawler.max_depth, 2);
        assert_eq!(config.crawler.max_pages, 50);
        assert_eq!(config.crawler.delay_secs, 0.25);
        assert_eq!(config.crawler.workers, 4);
        assert!(config.crawler.keep_query);
        assert_eq!(config.user_agent.crawler_name, "TestCrawler");
        assert_eq!(config.output.stats_path, PathBuf::from("out/stats.csv"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let file = create_temp_config("[crawler]\nmax-depth = 1\n");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_depth, 1);
        assert_eq!(config.crawler.max_pages, 100);
        assert_eq!(config.crawler.delay_secs, 1.0);
        assert_eq!(config.user_agent.crawler_name, "gov-scraper");
        assert_eq!(config.output.errors_path, PathBuf::from("error_log.csv"));
    }

    #[test]
    fn test_empty_config_is_valid() {
        let file = create_temp_config("");
        assert!(load_config(file.path()).is_ok());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/crawl.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config("[crawler]\nmax-pages = 0\n");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_hash_matches_loaded_text() {
        let file = create_temp_config("[crawler]\nworkers = 2\n");

        let (config, hash) = load_config_with_hash(file.path()).unwrap();

        assert_eq!(config.crawler.workers, 2);
        assert_eq!(hash, compute_config_hash(file.path()).unwrap());
    }

    #[test]
    fn test_parse_config_rejects_bad_user_agent() {
        let result = parse_config("[user-agent]\ncrawler-name = \"gov scraper\"\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
