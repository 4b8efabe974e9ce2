use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use colored::Colorize;
use pns_registry::{Pns, RegistryConfig};
use pns_server::{PnsServer, ServerConfig};
use pns_store::{InMemoryNetwork, Session};
use pns_types::{ContainerAddress, IdentityProfile};
use serde_json::{json, Value};

use crate::cli::*;

/// Everything a command needs: the registry over the loaded state file.
struct Context {
    pns: Pns,
    network: Arc<InMemoryNetwork>,
    state: PathBuf,
    session: Session,
    format: OutputFormat,
}

impl Context {
    fn open(cli: &Cli) -> anyhow::Result<Self> {
        let config = load_registry_config(cli)?;
        let network = Arc::new(
            InMemoryNetwork::load_or_new(&cli.state)
                .with_context(|| format!("loading state file {}", cli.state.display()))?,
        );
        Ok(Self {
            pns: Pns::new(network.clone(), config),
            network,
            state: cli.state.clone(),
            session: Session::authorized(cli.app.clone(), "local"),
            format: cli.format.clone(),
        })
    }

    fn save(&self) -> anyhow::Result<()> {
        self.network
            .save(&self.state)
            .with_context(|| format!("saving state file {}", self.state.display()))
    }

    /// Print `value` as JSON, or run `text` for human output.
    fn emit(&self, value: Value, text: impl FnOnce()) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
            OutputFormat::Text => text(),
        }
        Ok(())
    }
}

fn load_registry_config(cli: &Cli) -> anyhow::Result<RegistryConfig> {
    match &cli.config {
        Some(path) => Ok(RegistryConfig::load(path)?),
        None => Ok(RegistryConfig::default()),
    }
}

fn parse_address(raw: &str) -> anyhow::Result<ContainerAddress> {
    ContainerAddress::from_hex(raw.trim()).with_context(|| format!("invalid container address {raw:?}"))
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    if let Command::Serve(args) = &cli.command {
        return cmd_serve(&cli, args).await;
    }
    let ctx = Context::open(&cli)?;
    match cli.command {
        Command::Name(args) => cmd_name(&ctx, args.action).await,
        Command::Service(args) => cmd_service(&ctx, args.action).await,
        Command::Provision(args) => cmd_provision(&ctx, args).await,
        Command::Resolve(args) => cmd_resolve(&ctx, args).await,
        Command::Profile(args) => cmd_profile(&ctx, args.action).await,
        Command::Serve(_) => Ok(()),
    }
}

async fn cmd_name(ctx: &Context, action: NameAction) -> anyhow::Result<()> {
    let directory = &ctx.pns.directory;
    match action {
        NameAction::Register { name } => {
            let address = directory.register_name(&ctx.session, &name).await?;
            ctx.save()?;
            ctx.emit(json!({ "name": name.trim(), "services_container": address }), || {
                println!("{} Registered {}", "✓".green().bold(), name.trim().yellow());
                println!("  Services container: {}", address.to_hex().cyan());
            })
        }
        NameAction::Resolve { name } => {
            let address = directory.resolve_name(&ctx.session, &name).await?;
            ctx.emit(json!({ "name": name.trim(), "services_container": address }), || {
                println!("{} → {}", name.trim().yellow(), address.to_hex().cyan());
            })
        }
        NameAction::List => {
            let names = directory.list_names(&ctx.session).await?;
            let value: Vec<Value> = names
                .iter()
                .map(|(n, a)| json!({ "name": n, "services_container": a }))
                .collect();
            ctx.emit(Value::Array(value), || {
                if names.is_empty() {
                    println!("No public names registered.");
                }
                for (name, address) in &names {
                    println!("{}  {}", address.short_hex().dimmed(), name.as_str().yellow());
                }
            })
        }
    }
}

async fn cmd_service(ctx: &Context, action: ServiceAction) -> anyhow::Result<()> {
    let services = &ctx.pns.services;
    match action {
        ServiceAction::Register { public_name, sub_name, resource, service } => {
            let resource = parse_address(&resource)?;
            let registered = services
                .register_service(&ctx.session, &public_name, &sub_name, &service, &resource)
                .await?;
            ctx.save()?;
            ctx.emit(serde_json::to_value(&registered)?, || {
                println!(
                    "{} Service {} of {} → {} (version {})",
                    "✓".green().bold(),
                    registered.key.as_str().yellow(),
                    public_name.trim().bold(),
                    registered.resource.to_hex().cyan(),
                    registered.version,
                );
            })
        }
        ServiceAction::Reserve { public_name, sub_name, service } => {
            let key = services
                .reserve_service(&ctx.session, &public_name, &sub_name, &service)
                .await?;
            ctx.save()?;
            ctx.emit(json!({ "key": key }), || {
                println!("{} Reserved {} under {}", "✓".green().bold(), key.as_str().yellow(), public_name.trim().bold());
            })
        }
        ServiceAction::Resolve { public_name, sub_name, service } => {
            let resource = services
                .resolve_service(&ctx.session, &public_name, &sub_name, &service)
                .await?;
            ctx.emit(json!({ "resource": resource }), || {
                println!("{}", resource.to_hex().cyan());
            })
        }
        ServiceAction::List { public_name } => {
            let records = services.list_services(&ctx.session, &public_name).await?;
            ctx.emit(serde_json::to_value(&records)?, || {
                if records.is_empty() {
                    println!("No services under {}.", public_name.trim().bold());
                }
                for record in &records {
                    let target = match &record.resource {
                        Some(address) => address.to_hex().cyan().to_string(),
                        None => "(reserved)".dimmed().to_string(),
                    };
                    println!("{}  {}  v{}", record.key.as_str().yellow(), target, record.version);
                }
            })
        }
    }
}

async fn cmd_provision(ctx: &Context, args: ProvisionArgs) -> anyhow::Result<()> {
    let provisioner = &ctx.pns.provisioner;
    let prefix = args.prefix.as_deref();
    let result = match &args.profile {
        Some(profile) => {
            let profile = parse_address(profile)?;
            provisioner
                .provision_and_publish(
                    &ctx.session,
                    &args.identity_uri,
                    &args.hosting_sub_name,
                    prefix,
                    &ctx.pns.profiles,
                    &profile,
                )
                .await
        }
        None => {
            provisioner
                .provision_storage(&ctx.session, &args.identity_uri, &args.hosting_sub_name, prefix)
                .await
        }
    };
    // Steps that succeeded before a failure stay committed.
    ctx.save()?;
    let storage = result?;
    ctx.emit(serde_json::to_value(&storage)?, || {
        println!("{} Storage provisioned at {}", "✓".green().bold(), storage.uri.yellow().bold());
        println!("  Public name: {}", storage.storage_name.bold());
        println!("  Folder: {}", storage.folder.to_hex().cyan());
        println!("  Path: {}", storage.service_path);
    })
}

async fn cmd_resolve(ctx: &Context, args: ResolveArgs) -> anyhow::Result<()> {
    let resource = ctx
        .pns
        .services
        .resolve_uri(&ctx.session, &args.uri, &ctx.pns.config.default_scheme)
        .await?;
    ctx.emit(json!({ "uri": args.uri, "resource": resource }), || {
        println!("{} → {}", args.uri.yellow(), resource.to_hex().cyan());
    })
}

async fn cmd_profile(ctx: &Context, action: ProfileAction) -> anyhow::Result<()> {
    let profiles = &ctx.pns.profiles;
    match action {
        ProfileAction::Create { uri, nick, name, website, image, image_mime_type } => {
            let profile = IdentityProfile {
                uri: Some(uri),
                nick: Some(nick),
                name,
                website,
                image,
                image_mime_type,
                storage: None,
            };
            let address = profiles.create_profile(&ctx.session, profile).await?;
            ctx.save()?;
            ctx.emit(json!({ "address": address }), || {
                println!("{} Profile created at {}", "✓".green().bold(), address.to_hex().cyan());
            })
        }
        ProfileAction::Show { address } => {
            let address = parse_address(&address)?;
            let (profile, version) = profiles.fetch_profile(&ctx.session, &address).await?;
            ctx.emit(json!({ "profile": profile, "version": version }), || {
                let field = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".into());
                println!("Profile {} (version {})", address.short_hex().cyan(), version);
                println!("  URI: {}", field(&profile.uri).yellow());
                println!("  Nick: {}", field(&profile.nick));
                println!("  Name: {}", field(&profile.name));
                println!("  Website: {}", field(&profile.website));
                println!("  Storage: {}", field(&profile.storage).yellow());
            })
        }
        ProfileAction::Update { address, uri, nick, name, website, image, image_mime_type } => {
            let address = parse_address(&address)?;
            let (mut profile, read_version) = profiles.fetch_profile(&ctx.session, &address).await?;
            let overlay = [
                (&mut profile.uri, uri),
                (&mut profile.nick, nick),
                (&mut profile.name, name),
                (&mut profile.website, website),
                (&mut profile.image, image),
                (&mut profile.image_mime_type, image_mime_type),
            ];
            for (field, value) in overlay {
                if value.is_some() {
                    *field = value;
                }
            }
            let version = profiles
                .update_profile(&ctx.session, &address, profile, read_version)
                .await?;
            ctx.save()?;
            ctx.emit(json!({ "address": address, "version": version }), || {
                println!("{} Profile {} updated (version {})", "✓".green().bold(), address.short_hex().cyan(), version);
            })
        }
        ProfileAction::List => {
            let listed = profiles.list_profiles(&ctx.session).await?;
            ctx.emit(serde_json::to_value(&listed)?, || {
                if listed.is_empty() {
                    println!("No profiles owned by {}.", ctx.session.app_id().bold());
                }
                for row in &listed {
                    let nick = row.profile.nick.clone().unwrap_or_default();
                    let uri = row.profile.uri.clone().unwrap_or_default();
                    println!("{}  {}  {}  v{}", row.address.to_hex().cyan(), nick.yellow(), uri, row.version);
                }
            })
        }
    }
}

async fn cmd_serve(cli: &Cli, args: &ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.server_config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    config.bind_addr = args
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {:?}", args.bind))?;
    config.state_file = Some(cli.state.clone());
    if cli.config.is_some() {
        config.registry = load_registry_config(cli)?;
    }
    if args.no_anonymous_read {
        config.allow_anonymous_read = false;
    }
    println!("PNS gateway on {} (state: {})", config.bind_addr.to_string().bold(), cli.state.display());
    PnsServer::open(config)?.serve().await?;
    Ok(())
}
