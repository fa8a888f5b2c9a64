//! Command-line front end for the wishlist.
//!
//! # Responsibility
//! - Parse visitor and admin commands and map them onto `WishService`.
//! - Load config, open storage and set up logging before dispatch.
//!
//! # Invariants
//! - Admin commands run only after `verify_admin` accepted the secret.
//! - Secrets are printed only to the visitor who just fulfilled a wish.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use wishlist_core::db::open_db;
use wishlist_core::{
    init_logging, load_config, KnownSecrets, SqliteWishRepository, Wish, WishFields, WishId,
    WishService, WishView, WishlistConfig,
};

#[derive(Parser)]
#[command(name = "wishlist")]
#[command(about = "Shared wishlist with anonymous claiming", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON config file; defaults apply when omitted
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert the demo wishes into an empty list
    Seed,

    /// List active wishes for a visitor
    List {
        /// Hide who claimed what, except your own claims
        #[arg(long)]
        no_spoiler: bool,

        /// Undo secrets you hold (can be repeated)
        #[arg(long = "known", value_name = "SECRET")]
        known: Vec<String>,
    },

    /// Show a single wish; the giver is only shown on your own claims
    Show {
        #[arg(value_name = "ID")]
        id: WishId,

        /// Undo secrets you hold (can be repeated)
        #[arg(long = "known", value_name = "SECRET")]
        known: Vec<String>,
    },

    /// Claim a wish
    Fulfill {
        #[arg(value_name = "ID")]
        id: WishId,

        /// Name shown as giver
        #[arg(long)]
        giver: String,
    },

    /// Release a claim using its undo secret
    Undo {
        #[arg(value_name = "SECRET")]
        secret: String,
    },

    /// Add a wish (admin)
    Add {
        #[command(flatten)]
        admin: AdminArgs,
        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Overwrite all fields of a wish (admin)
    Edit {
        #[command(flatten)]
        admin: AdminArgs,
        #[arg(value_name = "ID")]
        id: WishId,
        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Move a wish to the deleted list (admin)
    Delete {
        #[command(flatten)]
        admin: AdminArgs,
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Bring a deleted wish back (admin)
    Restore {
        #[command(flatten)]
        admin: AdminArgs,
        #[command(flatten)]
        target: TargetArgs,
    },

    /// List deleted wishes, newest first (admin)
    Deleted {
        #[command(flatten)]
        admin: AdminArgs,
    },

    /// Print wish counts (admin)
    Stats {
        #[command(flatten)]
        admin: AdminArgs,
    },
}

#[derive(Args)]
struct AdminArgs {
    /// Shared admin secret from the config
    #[arg(long, env = "WISHLIST_ADMIN_SECRET", hide_env_values = true)]
    admin_secret: String,
}

#[derive(Args)]
struct FieldArgs {
    #[arg(long)]
    title: String,

    /// 1 (nice to have) to 5 (most wanted)
    #[arg(long, default_value_t = 3)]
    priority: i64,

    #[arg(long, default_value = "")]
    desc: String,

    #[arg(long, default_value = "")]
    link: String,

    /// Wish can never be claimed
    #[arg(long)]
    endless: bool,

    #[arg(long, default_value = "")]
    giver: String,
}

impl FieldArgs {
    fn to_fields(&self) -> WishFields {
        WishFields::new(self.title.as_str(), self.priority)
            .with_desc(self.desc.as_str())
            .with_link(self.link.as_str())
            .endless(self.endless)
            .with_giver(self.giver.as_str())
    }
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct TargetArgs {
    #[arg(long)]
    id: Option<WishId>,

    #[arg(long)]
    secret: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => WishlistConfig::default(),
    };

    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir).context("failed to initialise logging")?;
    }

    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open `{}`", config.db_path.display()))?;
    let service = WishService::new(SqliteWishRepository::try_new(&conn)?);

    run(cli.command, &config, &service)
}

fn run(
    command: Commands,
    config: &WishlistConfig,
    service: &WishService<SqliteWishRepository<'_>>,
) -> Result<()> {
    match command {
        Commands::Seed => {
            let inserted = service.seed_defaults()?;
            println!("inserted {inserted} wishes");
        }
        Commands::List { no_spoiler, known } => {
            let secrets: KnownSecrets = known.into_iter().collect();
            let views = if no_spoiler {
                service.priority_ordered_wishes_no_spoiler(&secrets)?
            } else {
                service.priority_ordered_wishes(&secrets)?
            };
            println!("Wunschliste von {}", config.owner_name);
            for view in &views {
                print_view(view);
            }
        }
        Commands::Show { id, known } => {
            let secrets: KnownSecrets = known.into_iter().collect();
            print_view_details(&service.wish_view(id, &secrets)?);
        }
        Commands::Fulfill { id, giver } => {
            let wish = service.fulfill(id, &giver)?;
            println!("claimed #{} `{}`", wish.id(), wish.title());
            println!("undo secret: {}", wish.secret());
        }
        Commands::Undo { secret } => {
            let wish = service.undo(&secret)?;
            println!("released #{} `{}`", wish.id(), wish.title());
        }
        Commands::Add { admin, fields } => {
            require_admin(config, &admin)?;
            print_wish(&service.add(&fields.to_fields())?);
        }
        Commands::Edit { admin, id, fields } => {
            require_admin(config, &admin)?;
            print_wish(&service.modify(id, &fields.to_fields())?);
        }
        Commands::Delete { admin, target } => {
            require_admin(config, &admin)?;
            let wish = service.soft_delete(target.id, target.secret.as_deref())?;
            println!("deleted #{}", wish.id());
        }
        Commands::Restore { admin, target } => {
            require_admin(config, &admin)?;
            let wish = service.restore(target.id, target.secret.as_deref())?;
            println!("restored #{}", wish.id());
        }
        Commands::Deleted { admin } => {
            require_admin(config, &admin)?;
            for wish in service.list_deleted()? {
                print_wish(&wish);
            }
        }
        Commands::Stats { admin } => {
            require_admin(config, &admin)?;
            let stats = service.stats()?;
            println!(
                "count={} fulfilled={} deleted={}",
                stats.count, stats.fulfilled, stats.nr_deleted
            );
        }
    }
    Ok(())
}

fn require_admin(config: &WishlistConfig, admin: &AdminArgs) -> Result<()> {
    if !config.verify_admin(&admin.admin_secret) {
        info!("event=admin_auth module=cli status=denied");
        bail!("admin access denied");
    }
    Ok(())
}

fn print_view(view: &WishView) {
    let wish = &view.wish;
    let status = match view.visible_giver() {
        Some(giver) if view.is_own => format!("claimed by you ({giver})"),
        Some(giver) => format!("claimed by {giver}"),
        None if wish.endless() => "endless".to_string(),
        None => "open".to_string(),
    };
    println!(
        "#{:<4} [{}] {} - {}{}",
        wish.id(),
        "*".repeat(wish.priority().max(0) as usize),
        wish.title(),
        status,
        domain_suffix(wish)
    );
}

fn print_view_details(view: &WishView) {
    let wish = &view.wish;
    println!("#{} {}", wish.id(), wish.title());
    println!("  priority: {}", wish.priority());
    if !wish.desc().is_empty() {
        println!("  description: {}", wish.desc());
    }
    if !wish.link().is_empty() {
        println!("  link: {}{}", wish.link(), domain_suffix(wish));
    }
    if wish.endless() {
        println!("  endless");
    }
    if let Some(giver) = view.visible_giver() {
        println!("  claimed by you ({giver})");
    }
}

/// Full admin rendering, giver included.
fn print_wish(wish: &Wish) {
    println!("#{} {}", wish.id(), wish.title());
    println!("  priority: {}", wish.priority());
    if !wish.desc().is_empty() {
        println!("  description: {}", wish.desc());
    }
    if !wish.link().is_empty() {
        println!("  link: {}{}", wish.link(), domain_suffix(wish));
    }
    if wish.endless() {
        println!("  endless");
    }
    if wish.is_fulfilled() {
        println!("  giver: {}", wish.giver());
    }
    if let Some(deleted) = wish.deleted() {
        println!("  deleted at: {deleted}");
    }
}

fn domain_suffix(wish: &Wish) -> String {
    match wish.link_domain() {
        domain if domain.is_empty() => String::new(),
        domain => format!(" ({domain})"),
    }
}
