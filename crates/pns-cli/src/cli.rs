use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "pns",
    about = "Public Name System: register names, publish services, provision storage",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// JSON snapshot of the local network
    #[arg(long, global = true, default_value = "pns-state.json")]
    pub state: PathBuf,

    /// Registry configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// App id that owns containers created by this CLI
    #[arg(long, global = true, default_value = "pns-cli")]
    pub app: String,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Register, resolve or list public names
    Name(NameArgs),
    /// Manage services under a public name
    Service(ServiceArgs),
    /// Provision storage for an identity
    Provision(ProvisionArgs),
    /// Resolve a service URI to its container
    Resolve(ResolveArgs),
    /// Create, update, show or list identity profiles
    Profile(ProfileArgs),
    /// Start the HTTP gateway
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct NameArgs {
    #[command(subcommand)]
    pub action: NameAction,
}

#[derive(Subcommand)]
pub enum NameAction {
    Register { name: String },
    Resolve { name: String },
    List,
}

#[derive(Args)]
pub struct ServiceArgs {
    #[command(subcommand)]
    pub action: ServiceAction,
}

#[derive(Subcommand)]
pub enum ServiceAction {
    Register {
        public_name: String,
        sub_name: String,
        /// Hex address of the container backing the service
        resource: String,
        #[arg(long, default_value = "www")]
        service: String,
    },
    /// Reserve a key so it can be filled later
    Reserve {
        public_name: String,
        sub_name: String,
        #[arg(long, default_value = "www")]
        service: String,
    },
    Resolve {
        public_name: String,
        sub_name: String,
        #[arg(long, default_value = "www")]
        service: String,
    },
    List { public_name: String },
}

#[derive(Args)]
pub struct ProvisionArgs {
    /// Identity URI, e.g. safe://happybeing
    pub identity_uri: String,
    /// Sub name the storage is published under
    pub hosting_sub_name: String,
    #[arg(long)]
    pub prefix: Option<String>,
    /// Profile container to record the storage URI on
    #[arg(long)]
    pub profile: Option<String>,
}

#[derive(Args)]
pub struct ResolveArgs {
    pub uri: String,
}

#[derive(Args)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub action: ProfileAction,
}

#[derive(Subcommand)]
pub enum ProfileAction {
    Create {
        #[arg(long)]
        uri: String,
        #[arg(long)]
        nick: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        website: Option<String>,
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        image_mime_type: Option<String>,
    },
    Show { address: String },
    /// Change fields of an existing profile; omitted fields keep their value
    Update {
        address: String,
        #[arg(long)]
        uri: Option<String>,
        #[arg(long)]
        nick: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        website: Option<String>,
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        image_mime_type: Option<String>,
    },
    /// List profiles created by this app
    List,
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1:8730")]
    pub bind: String,
    /// Server configuration file (TOML); --bind and --state still apply
    #[arg(long)]
    pub server_config: Option<PathBuf>,
    #[arg(long)]
    pub no_anonymous_read: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_name_register() {
        let cli = Cli::try_parse_from(["pns", "name", "register", "happybeing"]).unwrap();
        if let Command::Name(NameArgs { action: NameAction::Register { name } }) = cli.command {
            assert_eq!(name, "happybeing");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_name_list() {
        let cli = Cli::try_parse_from(["pns", "name", "list"]).unwrap();
        assert!(matches!(cli.command, Command::Name(NameArgs { action: NameAction::List })));
    }

    #[test]
    fn parse_service_register_defaults_to_www() {
        let cli = Cli::try_parse_from(["pns", "service", "register", "happybeing", "blog", "ab"]).unwrap();
        if let Command::Service(ServiceArgs { action: ServiceAction::Register { service, resource, .. } }) = cli.command {
            assert_eq!(service, "www");
            assert_eq!(resource, "ab");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_service_reserve_with_service() {
        let cli = Cli::try_parse_from(["pns", "service", "reserve", "happybeing", "files", "--service", "ldp"]).unwrap();
        if let Command::Service(ServiceArgs { action: ServiceAction::Reserve { service, .. } }) = cli.command {
            assert_eq!(service, "ldp");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_provision() {
        let cli = Cli::try_parse_from(["pns", "provision", "safe://happybeing", "files", "--prefix", "data"]).unwrap();
        if let Command::Provision(args) = cli.command {
            assert_eq!(args.identity_uri, "safe://happybeing");
            assert_eq!(args.hosting_sub_name, "files");
            assert_eq!(args.prefix, Some("data".into()));
            assert!(args.profile.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_profile_create() {
        let cli = Cli::try_parse_from([
            "pns", "profile", "create", "--uri", "safe://happybeing", "--nick", "hb", "--image-mime-type", "image/png",
        ])
        .unwrap();
        if let Command::Profile(ProfileArgs { action: ProfileAction::Create { nick, image_mime_type, .. } }) = cli.command {
            assert_eq!(nick, "hb");
            assert_eq!(image_mime_type, Some("image/png".into()));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_profile_update_and_list() {
        let cli = Cli::try_parse_from(["pns", "profile", "update", "ab12", "--website", "https://hb.example"]).unwrap();
        if let Command::Profile(ProfileArgs { action: ProfileAction::Update { address, website, nick, .. } }) = cli.command {
            assert_eq!(address, "ab12");
            assert_eq!(website, Some("https://hb.example".into()));
            assert!(nick.is_none());
        } else { panic!("wrong command"); }

        let cli = Cli::try_parse_from(["pns", "profile", "list"]).unwrap();
        assert!(matches!(cli.command, Command::Profile(ProfileArgs { action: ProfileAction::List })));
    }

    #[test]
    fn parse_serve() {
        let cli = Cli::try_parse_from(["pns", "serve", "--bind", "0.0.0.0:8080", "--no-anonymous-read"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind, "0.0.0.0:8080");
            assert!(args.no_anonymous_read);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_globals() {
        let cli = Cli::try_parse_from(["pns", "--verbose", "--state", "/tmp/s.json", "resolve", "safe://x"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.state, PathBuf::from("/tmp/s.json"));
        assert_eq!(cli.app, "pns-cli");
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["pns", "--format", "json", "name", "list"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
