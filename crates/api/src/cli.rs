//! Command-line surface of the `nowplaying` client

use clap::{Parser, Subcommand};
use nowplaying_domain::{ClientConfig, StoreBackend};

#[derive(Debug, Parser)]
#[command(
    name = "nowplaying",
    version,
    about = "Spotify now-playing client",
    long_about = "Log in through the relay, then follow the currently-playing track."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Relay base URL override
    #[arg(long, global = true)]
    pub relay_url: Option<String>,

    /// Keep the durable token record in the platform keychain
    #[arg(long, global = true)]
    pub keychain: bool,

    /// Directory for the durable token file
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Log in through the relay and store the tokens
    Login {
        /// Seconds to wait for the browser to come back
        #[arg(long, default_value = "300")]
        timeout_secs: u64,
    },

    /// Print the currently-playing track whenever it changes
    Watch {
        /// Poll interval in seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval_secs: Option<u64>,
    },

    /// Show the stored session
    Status,

    /// Forget the stored session
    Logout,
}

impl Cli {
    /// Layer command-line overrides on top of the environment configuration.
    pub fn apply_overrides(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(relay_url) = &self.relay_url {
            config.relay_url.clone_from(relay_url);
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = Some(dir.clone());
        }
        if self.keychain {
            config.store = StoreBackend::Keychain;
        }
        if let Command::Watch { interval_secs: Some(secs) } = self.command {
            config.poll_interval_seconds = secs;
        }
        config
    }

    /// Stable command name for logs.
    pub fn command_name(&self) -> &'static str {
        match self.command {
            Command::Login { .. } => "login",
            Command::Watch { .. } => "watch",
            Command::Status => "status",
            Command::Logout => "logout",
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_login_with_default_timeout() {
        let cli = Cli::try_parse_from(["nowplaying", "login"]).unwrap();
        assert_eq!(cli.command, Command::Login { timeout_secs: 300 });
        assert_eq!(cli.command_name(), "login");
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "nowplaying",
            "watch",
            "--interval-secs",
            "5",
            "--keychain",
            "--relay-url",
            "http://relay.local:4000",
        ])
        .unwrap();

        let config = cli.apply_overrides(ClientConfig::default());
        assert_eq!(config.poll_interval_seconds, 5);
        assert_eq!(config.store, StoreBackend::Keychain);
        assert_eq!(config.relay_url, "http://relay.local:4000");
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(Cli::try_parse_from(["nowplaying", "watch", "--interval-secs", "0"]).is_err());
    }

    #[test]
    fn overrides_leave_unset_fields_alone() {
        let cli = Cli::try_parse_from(["nowplaying", "status"]).unwrap();
        let base = ClientConfig { data_dir: Some("/var/lib/np".into()), ..ClientConfig::default() };

        let config = cli.apply_overrides(base);
        assert_eq!(config.data_dir.as_deref(), Some("/var/lib/np"));
        assert_eq!(config.store, StoreBackend::File);
    }
}
