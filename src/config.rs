use dotenv::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub default_group_name: String,
    pub default_group_description: String,
    pub default_page_size: i64,
    pub feed_capacity: usize,
    pub max_connections: u32,
}

impl Config {
    /// Loads the configuration from environment variables.
    /// Calls dotenv() automatically.
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://chat.db?mode=rwc".to_string());

        let default_group_name =
            env::var("DEFAULT_GROUP_NAME").unwrap_or_else(|_| "General".to_string());

        let default_group_description = env::var("DEFAULT_GROUP_DESCRIPTION")
            .unwrap_or_else(|_| "Public chat for everyone".to_string());

        let default_page_size = env::var("DEFAULT_PAGE_SIZE")
            .unwrap_or_else(|_| "50".to_string())
            .parse::<i64>()
            .map_err(|_| "Invalid DEFAULT_PAGE_SIZE: must be a positive number".to_string())?;

        let feed_capacity = env::var("FEED_CAPACITY")
            .unwrap_or_else(|_| "256".to_string())
            .parse::<usize>()
            .map_err(|_| "Invalid FEED_CAPACITY: must be a positive number".to_string())?;

        let max_connections = env::var("MAX_DB_CONNECTIONS")
            .unwrap_or_else(|_| "16".to_string())
            .parse::<u32>()
            .map_err(|_| "Invalid MAX_DB_CONNECTIONS: must be a positive number".to_string())?;

        Ok(Config {
            database_url,
            default_group_name,
            default_group_description,
            default_page_size,
            feed_capacity,
            max_connections,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            default_group_name: "General".to_string(),
            default_group_description: "Public chat for everyone".to_string(),
            default_page_size: 50,
            feed_capacity: 256,
            max_connections: 16,
        }
    }
}
