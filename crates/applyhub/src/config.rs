use std::env;
use std::str::FromStr;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Single table holding every entity (default: "applyhub")
    pub table_name: String,
    /// Index over `GSI_PK`/`CreatedAt` (default: "GSI1")
    pub created_index: String,
    /// Index over `CognitoID` (default: "GSI2")
    pub identity_index: String,
    /// Bucket for document content (default: "applyhub-documents")
    pub bucket_name: String,
    /// Custom endpoint URL, for local DynamoDB.
    pub aws_endpoint_url: Option<String>,
    /// AWS region (default: "us-east-1")
    pub aws_region: String,
    /// Log output format (default: pretty)
    pub log_format: LogFormat,
    /// Lifetime of object access grants in seconds (default: 900)
    pub presign_ttl_seconds: i64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TABLE_NAME` - Table name (default: "applyhub")
    /// - `GSI_NAME` - Creation-time index name (default: "GSI1")
    /// - `GSI_NAME_2` - Identity index name (default: "GSI2")
    /// - `BUCKET_NAME` - Document bucket (default: "applyhub-documents")
    /// - `AWS_ENDPOINT_URL` - Custom endpoint (optional)
    /// - `AWS_REGION` - Region (default: "us-east-1")
    /// - `LOG_FORMAT` - `pretty` or `json` (default: "pretty")
    /// - `PRESIGN_TTL_SECONDS` - Access grant lifetime (default: 900)
    pub fn from_env() -> Self {
        Self {
            table_name: env::var("TABLE_NAME").unwrap_or_else(|_| "applyhub".to_string()),
            created_index: env::var("GSI_NAME").unwrap_or_else(|_| "GSI1".to_string()),
            identity_index: env::var("GSI_NAME_2").unwrap_or_else(|_| "GSI2".to_string()),
            bucket_name: env::var("BUCKET_NAME")
                .unwrap_or_else(|_| "applyhub-documents".to_string()),
            aws_endpoint_url: env::var("AWS_ENDPOINT_URL").ok(),
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            log_format: env::var("LOG_FORMAT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            presign_ttl_seconds: env::var("PRESIGN_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ttl: &i64| *ttl > 0)
                .unwrap_or(900),
        }
    }

    /// Get the access grant lifetime as a Duration.
    pub fn presign_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.presign_ttl_seconds)
    }

    /// Returns a display string for the target store.
    pub fn target_display(&self) -> String {
        match &self.aws_endpoint_url {
            Some(url) => format!("Local DynamoDB ({}) table {}", url, self.table_name),
            None => format!(
                "AWS DynamoDB (region: {}) table {}",
                self.aws_region, self.table_name
            ),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presign_ttl_conversion() {
        let config = Config {
            table_name: "applyhub".to_string(),
            created_index: "GSI1".to_string(),
            identity_index: "GSI2".to_string(),
            bucket_name: "docs".to_string(),
            aws_endpoint_url: None,
            aws_region: "eu-central-1".to_string(),
            log_format: LogFormat::Json,
            presign_ttl_seconds: 60,
        };

        assert_eq!(config.presign_ttl(), chrono::Duration::seconds(60));
        assert_eq!(
            config.target_display(),
            "AWS DynamoDB (region: eu-central-1) table applyhub"
        );
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("Pretty".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_default_values() {
        // Clear environment variables to test defaults
        env::remove_var("TABLE_NAME");
        env::remove_var("GSI_NAME");
        env::remove_var("GSI_NAME_2");
        env::remove_var("BUCKET_NAME");
        env::remove_var("AWS_ENDPOINT_URL");
        env::remove_var("AWS_REGION");
        env::remove_var("LOG_FORMAT");
        env::remove_var("PRESIGN_TTL_SECONDS");

        let config = Config::from_env();

        assert_eq!(config.table_name, "applyhub");
        assert_eq!(config.created_index, "GSI1");
        assert_eq!(config.identity_index, "GSI2");
        assert_eq!(config.bucket_name, "applyhub-documents");
        assert_eq!(config.aws_endpoint_url, None);
        assert_eq!(config.aws_region, "us-east-1");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.presign_ttl_seconds, 900);
    }
}
