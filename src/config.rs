use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// bcrypt work factor used when hashing account passwords.
    pub password_cost: u32,
    /// Adds the `Secure` attribute to the session cookie.
    pub secure_cookies: bool,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Campus records administration service")]
pub struct Args {
    /// Host to bind to (overrides CAMPUS_RECORDS_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides CAMPUS_RECORDS_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides CAMPUS_RECORDS_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// bcrypt cost for password hashes (overrides CAMPUS_RECORDS_PASSWORD_COST)
    #[arg(long)]
    pub password_cost: Option<u32>,

    /// Mark the session cookie `Secure` (overrides CAMPUS_RECORDS_SECURE_COOKIES)
    #[arg(long)]
    pub secure_cookies: bool,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        Ok((Self::merge(args)?, migrate))
    }

    fn merge(args: Args) -> Result<Self> {
        // --- Environment fallback ---
        let env_host = env::var("CAMPUS_RECORDS_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = parse_env("CAMPUS_RECORDS_PORT", 3000u16)?;
        let env_db = env::var("CAMPUS_RECORDS_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/campus_records.db".into());
        let env_cost = parse_env("CAMPUS_RECORDS_PASSWORD_COST", bcrypt::DEFAULT_COST)?;
        let env_secure = parse_env("CAMPUS_RECORDS_SECURE_COOKIES", false)?;

        // --- Merge ---
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            password_cost: args.password_cost.unwrap_or(env_cost),
            secure_cookies: args.secure_cookies || env_secure,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_take_precedence() {
        let args = Args::parse_from([
            "campus-records",
            "--host",
            "127.0.0.1",
            "--port",
            "8088",
            "--database-url",
            "sqlite::memory:",
            "--password-cost",
            "4",
        ]);
        let cfg = AppConfig::merge(args).unwrap();
        assert_eq!(cfg.addr(), "127.0.0.1:8088");
        assert_eq!(cfg.database_url, "sqlite::memory:");
        assert_eq!(cfg.password_cost, 4);
    }

    #[test]
    fn migrate_flag_is_parsed() {
        let args = Args::parse_from(["campus-records", "--migrate"]);
        assert!(args.migrate);
        assert!(!args.secure_cookies);
    }
}
