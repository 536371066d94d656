// brandforge: Branding context and prompt injection for AI site generation
// License: Apache-2.0

use anyhow::Context;
use brandforge::acquire::{AcquiredLogo, DroppedFile};
use brandforge::app::load_base_prompt;
use brandforge::asset::mime_for_path;
use brandforge::branding::BrandingProfile;
use brandforge::config::Config;
use brandforge::{BrandingApp, LogoUpload, ManualBrandForm};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

const LOGO: &str = "🎨";

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "brandforge",
    about = "brandforge: brand identity capture and prompt injection for AI website builders",
    version
)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init,
    /// Show version information
    Version,
    #[command(flatten)]
    Brand(BrandCommands),
}

/// Commands that operate on the branding stores.
#[derive(Subcommand)]
enum BrandCommands {
    /// Show the current brand profile
    Show,
    /// Submit the manual brand form and turn custom branding on
    Set {
        #[arg(long)]
        primary: Option<String>,
        #[arg(long)]
        secondary: Option<String>,
        #[arg(long)]
        accent: Option<String>,
        #[arg(long)]
        font: Option<String>,
        /// Logo image file
        #[arg(long)]
        logo: Option<PathBuf>,
    },
    /// Turn custom branding on
    Enable,
    /// Turn custom branding off
    Disable,
    /// Restore the default brand profile
    Reset,
    /// Extract colors, font and logo from a website
    Extract {
        /// Website URL or bare domain
        url: String,
    },
    /// Manage brand logos
    Logo {
        #[command(subcommand)]
        action: LogoCommands,
    },
    /// Print the system prompt for the next chat turn
    Prompt {
        /// Base prompt file (overrides config)
        #[arg(long)]
        base_file: Option<String>,
    },
}

#[derive(Subcommand)]
enum LogoCommands {
    /// Upload logo files; with several files the first image wins
    Add {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Use a pasted data:image/...;base64 URL as the logo
    Paste { data_url: String },
    /// List stored logos, most recent first
    List,
    /// Delete a stored logo
    Delete { id: String },
    /// Write a stored logo to disk
    Export {
        id: String,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    brandforge::logger::init();

    let cli = Cli::parse();
    let config_path = cli.config;

    let command = cli.command.unwrap_or(Commands::Brand(BrandCommands::Show));
    let result = run(command, config_path.as_deref()).await;

    if let Err(e) = result {
        eprintln!("{} Error: {:#}", LOGO, e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, config_path: Option<&str>) -> anyhow::Result<()> {
    match command {
        Commands::Init => init_cmd(config_path),
        Commands::Version => {
            version_cmd();
            Ok(())
        }
        Commands::Brand(command) => {
            let cfg = load_config(config_path);
            let app = BrandingApp::open(&cfg).await?;
            brand_cmd(&app, &cfg, command).await
        }
    }
}

async fn brand_cmd(app: &BrandingApp, cfg: &Config, command: BrandCommands) -> anyhow::Result<()> {
    match command {
        BrandCommands::Show => print_profile(&app.current()),
        BrandCommands::Set {
            primary,
            secondary,
            accent,
            font,
            logo,
        } => {
            let logo = match logo {
                Some(path) => Some(read_logo_file(&path)?),
                None => None,
            };
            let outcome = app
                .submit_manual(&ManualBrandForm {
                    primary_color: primary,
                    secondary_color: secondary,
                    accent_color: accent,
                    font_family: font,
                    logo: logo.map(|file| LogoUpload {
                        bytes: file.bytes,
                        mime_type: file.mime_type,
                    }),
                })
                .await?;
            match &outcome.logo {
                Some(Ok(acquired)) => print_acquired(acquired),
                Some(Err(e)) => eprintln!("{} Logo not saved: {}", LOGO, e),
                None => {}
            }
            println!("{} Brand profile updated", LOGO);
            print_profile(&outcome.profile);
        }
        BrandCommands::Enable => {
            app.set_enabled(true);
            println!("{} Custom branding enabled", LOGO);
        }
        BrandCommands::Disable => {
            app.set_enabled(false);
            println!("{} Custom branding disabled", LOGO);
        }
        BrandCommands::Reset => {
            print_profile(&app.reset());
        }
        BrandCommands::Extract { url } => extract_cmd(app, &url).await?,
        BrandCommands::Logo { action } => logo_cmd(app, action).await?,
        BrandCommands::Prompt { base_file } => {
            let base = match base_file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading base prompt {}", path))?,
                None => load_base_prompt(cfg)?,
            };
            println!("{}", app.system_prompt(&base).await);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn init_cmd(config_path: Option<&str>) -> anyhow::Result<()> {
    let path = match config_path {
        Some(p) => PathBuf::from(p),
        None => Config::default_path()?,
    };

    if path.exists() {
        println!("  ⏭️  Config already exists at {}", path.display());
        return Ok(());
    }

    let cfg = Config::default();
    cfg.save(&path)?;
    std::fs::create_dir_all(cfg.data_path()?)?;
    println!("  ✅ Config created at {}", path.display());
    println!("\nNext steps:");
    println!("  1. Point extractor.relay_url at your brand relay");
    println!("  2. Run: brandforge extract example.com");
    println!("  3. Or set colors by hand: brandforge set --primary '#AA0000' --font Poppins");
    Ok(())
}

fn version_cmd() {
    println!("{} brandforge v{}", LOGO, brandforge::VERSION);
}

async fn extract_cmd(app: &BrandingApp, url: &str) -> anyhow::Result<()> {
    let outcome = app
        .extract(url, |message| println!("  … {}", message))
        .await?;

    match outcome {
        Some(profile) => {
            println!("{} Brand extracted from {}", LOGO, url);
            print_profile(&profile);
        }
        None => println!("{} A newer change superseded this extraction; nothing applied", LOGO),
    }
    Ok(())
}

async fn logo_cmd(app: &BrandingApp, action: LogoCommands) -> anyhow::Result<()> {
    match action {
        LogoCommands::Add { files } => {
            let dropped = files
                .iter()
                .map(|path| read_logo_file(path))
                .collect::<anyhow::Result<Vec<_>>>()?;

            let outcome = match dropped.as_slice() {
                [single] => app.upload_logo(&single.bytes, &single.mime_type).await?,
                many => app.drop_logo(many).await?,
            };
            print_acquired(&outcome);
        }
        LogoCommands::Paste { data_url } => {
            let outcome = app.paste_logo(&data_url).await?;
            print_acquired(&outcome);
        }
        LogoCommands::List => {
            let logos = app.list_logos().await?;
            if logos.is_empty() {
                println!("No stored logos");
            }
            let current = app.current().logo_ref.map(|r| r.id);
            for asset in logos {
                let marker = if current.as_deref() == Some(asset.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{} {}  {}  {}  {}",
                    marker,
                    asset.id,
                    asset.created_at.format("%Y-%m-%d %H:%M:%S"),
                    asset.mime_type,
                    asset.virtual_path
                );
            }
        }
        LogoCommands::Delete { id } => {
            app.delete_logo(&id).await?;
            println!("{} Deleted {}", LOGO, id);
        }
        LogoCommands::Export { id, out } => {
            let asset = app
                .assets()
                .get(&id)
                .await?
                .with_context(|| format!("no stored logo with id {}", id))?;
            let bytes = asset
                .decode()
                .with_context(|| format!("stored logo {} is corrupt", id))?;
            let out = out.unwrap_or_else(|| PathBuf::from(&asset.filename));
            std::fs::write(&out, bytes).with_context(|| format!("writing {}", out.display()))?;
            println!("{} Exported {} to {}", LOGO, id, out.display());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_config(path: Option<&str>) -> Config {
    let config_path = if let Some(p) = path {
        PathBuf::from(p)
    } else {
        Config::default_path().unwrap_or_else(|_| PathBuf::from("config.json"))
    };

    Config::load(&config_path).unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}, using defaults", e);
        Config::default()
    })
}

fn read_logo_file(path: &Path) -> anyhow::Result<DroppedFile> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path.to_string_lossy().to_string();
    let mime_type = mime_for_path(&name)
        .unwrap_or("application/octet-stream")
        .to_string();
    Ok(DroppedFile {
        name,
        mime_type,
        bytes,
    })
}

fn print_profile(profile: &BrandingProfile) {
    let status = if profile.is_custom_branding_enabled {
        "enabled"
    } else {
        "disabled"
    };
    println!("  Branding:  {}", status);
    println!("  Primary:   {}", profile.primary_color);
    println!("  Secondary: {}", profile.secondary_color);
    println!("  Accent:    {}", profile.accent_color);
    println!("  Font:      {}", profile.font_family);
    match (&profile.logo_ref, &profile.logo_data) {
        (Some(logo), _) => println!("  Logo:      {} ({})", logo.virtual_path, logo.id),
        (None, Some(_)) => println!("  Logo:      session only"),
        (None, None) => println!("  Logo:      none"),
    }
}

fn print_acquired(outcome: &AcquiredLogo) {
    match outcome {
        AcquiredLogo::Stored(asset) => {
            println!("{} Logo stored at {}", LOGO, asset.virtual_path)
        }
        AcquiredLogo::SessionOnly { download } => println!(
            "{} Logo storage unavailable; a copy was saved to {} and the logo is kept for this session only",
            LOGO,
            download.display()
        ),
    }
}
