use std::net::{Ipv4Addr, SocketAddr};

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgMatches, Command};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://tracker.db";
pub const HOST: Ipv4Addr = Ipv4Addr::LOCALHOST;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub port: u16,
    pub log_filter: String,
}

pub fn command() -> Command {
    Command::new("tracker-d")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Daily time tracking web server")
        .arg(
            Arg::new("database-url")
                .long("database-url")
                .env("DATABASE_URL")
                .default_value(DEFAULT_DATABASE_URL)
                .help("SQLite database to store entries in."),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .env("TRACKER_PORT")
                .value_parser(value_parser!(u16))
                .default_value("5000")
                .help("Port to listen on, bound to 127.0.0.1."),
        )
        .arg(
            Arg::new("log-filter")
                .long("log-filter")
                .default_value("info")
                .help("Log filter used when RUST_LOG is not set."),
        )
}

impl Settings {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let database_url = matches
            .get_one::<String>("database-url")
            .context("database url must be set")?
            .clone();
        let port = *matches.get_one::<u16>("port").context("port must be set")?;
        let log_filter = matches
            .get_one::<String>("log-filter")
            .cloned()
            .unwrap_or_else(|| "info".to_string());

        Ok(Settings {
            database_url,
            port,
            log_filter,
        })
    }

    pub fn address(&self) -> SocketAddr {
        SocketAddr::from((HOST, self.port))
    }
}
