//! Command-line configuration

use crate::network::server::DEFAULT_PORT;
use crate::storage::Profile;
use clap::{Args, Parser, Subcommand};

/// Channel joined when none is given or saved
pub const DEFAULT_CHANNEL: &str = "general";

/// Guild name a hub serves when none is given
pub const DEFAULT_GUILD: &str = "lan";

#[derive(Debug, Parser)]
#[command(name = "spyword")]
#[command(about = "Team word-guessing game played in LAN chat channels")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a hub that hosts channels and games
    Serve(ServeArgs),
    /// Join a hub from the terminal
    Play(PlayArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// First port to try; the next free one is used if taken
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Guild name, advertised on the LAN and keyed for settings
    #[arg(short, long, default_value = DEFAULT_GUILD)]
    pub guild: String,

    /// Do not advertise over mDNS
    #[arg(long)]
    pub no_mdns: bool,
}

#[derive(Debug, Args)]
pub struct PlayArgs {
    /// Hub address (IP or IP:PORT); browse the LAN when absent
    #[arg(short, long)]
    pub connect: Option<String>,

    /// Display name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Channel to join
    #[arg(long)]
    pub channel: Option<String>,

    /// Refuse direct messages (you cannot be spymaster)
    #[arg(long, conflicts_with = "direct")]
    pub no_direct: bool,

    /// Accept direct messages again after --no-direct
    #[arg(long)]
    pub direct: bool,
}

/// Resolved client settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayConfig {
    pub connect: Option<String>,
    pub name: String,
    pub channel: String,
    pub allow_direct: bool,
}

impl PlayArgs {
    /// Merge flags over the saved profile; flags win. `fallback_name`
    /// is used when neither supplies a name.
    pub fn resolve(&self, saved: &Profile, fallback_name: &str) -> PlayConfig {
        let name = self
            .name
            .clone()
            .or_else(|| saved.handle.clone())
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| fallback_name.to_string());
        let channel = self
            .channel
            .clone()
            .or_else(|| saved.channel.clone())
            .unwrap_or_else(|| DEFAULT_CHANNEL.to_string());
        let allow_direct = if self.no_direct {
            false
        } else if self.direct {
            true
        } else {
            saved.allow_direct
        };

        PlayConfig {
            connect: self.connect.clone(),
            name,
            channel,
            allow_direct,
        }
    }
}

impl PlayConfig {
    /// What to save back for next time
    pub fn profile(&self) -> Profile {
        Profile {
            handle: Some(self.name.clone()),
            channel: Some(self.channel.clone()),
            allow_direct: self.allow_direct,
        }
    }
}

/// A name from the environment, trimmed to a chat-friendly length
pub fn default_name() -> String {
    std::env::var("USER")
        .unwrap_or_else(|_| "player".to_string())
        .chars()
        .take(16)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(args: &[&str]) -> PlayArgs {
        let argv = ["spyword", "play"].iter().chain(args.iter()).copied();
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Play(args) => args,
            other => panic!("expected play, got {:?}", other),
        }
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["spyword", "serve"]).unwrap();
        match cli.command {
            Command::Serve(args) => {
                assert_eq!(args.port, DEFAULT_PORT);
                assert_eq!(args.guild, DEFAULT_GUILD);
                assert!(!args.no_mdns);
            }
            other => panic!("expected serve, got {:?}", other),
        }
    }

    #[test]
    fn test_serve_flags() {
        let cli =
            Cli::try_parse_from(["spyword", "serve", "-p", "6000", "--guild", "den", "--no-mdns"])
                .unwrap();
        match cli.command {
            Command::Serve(args) => {
                assert_eq!(args.port, 6000);
                assert_eq!(args.guild, "den");
                assert!(args.no_mdns);
            }
            other => panic!("expected serve, got {:?}", other),
        }
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["spyword"]).is_err());
    }

    #[test]
    fn test_direct_flags_conflict() {
        assert!(Cli::try_parse_from(["spyword", "play", "--direct", "--no-direct"]).is_err());
    }

    #[test]
    fn test_resolve_uses_defaults() {
        let config = play(&[]).resolve(&Profile::default(), "tux");
        assert_eq!(
            config,
            PlayConfig {
                connect: None,
                name: "tux".to_string(),
                channel: DEFAULT_CHANNEL.to_string(),
                allow_direct: true,
            }
        );
    }

    #[test]
    fn test_resolve_prefers_saved_over_defaults() {
        let saved = Profile {
            handle: Some("ana".into()),
            channel: Some("den".into()),
            allow_direct: false,
        };
        let config = play(&[]).resolve(&saved, "tux");
        assert_eq!(config.name, "ana");
        assert_eq!(config.channel, "den");
        assert!(!config.allow_direct);
    }

    #[test]
    fn test_resolve_flags_win() {
        let saved = Profile {
            handle: Some("ana".into()),
            channel: Some("den".into()),
            allow_direct: false,
        };
        let config = play(&["-n", "bea", "--channel", "attic", "--direct", "-c", "10.0.0.2"])
            .resolve(&saved, "tux");
        assert_eq!(config.name, "bea");
        assert_eq!(config.channel, "attic");
        assert!(config.allow_direct);
        assert_eq!(config.connect.as_deref(), Some("10.0.0.2"));

        let config = play(&["--no-direct"]).resolve(&Profile::default(), "tux");
        assert!(!config.allow_direct);
    }

    #[test]
    fn test_blank_name_falls_back() {
        let config = play(&["--name", "   "]).resolve(&Profile::default(), "tux");
        assert_eq!(config.name, "tux");
    }

    #[test]
    fn test_profile_round_trip() {
        let config = play(&["-n", "bea"]).resolve(&Profile::default(), "tux");
        let profile = config.profile();
        assert_eq!(profile.handle.as_deref(), Some("bea"));
        assert_eq!(play(&[]).resolve(&profile, "tux"), config);
    }
}
