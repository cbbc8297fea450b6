//! Operator CLI for the storefront backend.
//!
//! `db` covers connectivity and migrations; `admin create` seeds an admin
//! account, which is otherwise unreachable — registration only ever
//! produces the `user` role, and only an existing admin can promote.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use shopd_schemas::Role;

#[derive(Parser)]
#[command(name = "shopd")]
#[command(about = "Storefront backend CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Admin account management
    Admin {
        #[command(subcommand)]
        cmd: AdminCmd,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    /// Check connectivity and schema presence.
    Status,

    /// Apply SQL migrations.
    Migrate,
}

#[derive(Subcommand)]
enum AdminCmd {
    /// Create (or promote) an admin account.
    Create {
        #[arg(long)]
        email: String,

        /// Plaintext password; hashed with bcrypt before storage.
        #[arg(long)]
        password: String,

        #[arg(long, default_value = "Administrator")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Db { cmd } => match cmd {
            DbCmd::Status => {
                let pool = shopd_db::connect_from_env().await?;
                let st = shopd_db::status(&pool).await?;
                println!("db ok: {}", st.ok);
                println!("schema present: {}", st.has_users_table);
            }
            DbCmd::Migrate => {
                let pool = shopd_db::connect_from_env().await?;
                shopd_db::migrate(&pool).await?;
                println!("migrations applied");
            }
        },

        Commands::Admin { cmd } => match cmd {
            AdminCmd::Create {
                email,
                password,
                name,
            } => {
                if password.len() < 8 {
                    bail!("refusing to create admin with a password under 8 characters");
                }

                let pool = shopd_db::connect_from_env().await?;

                let password_hash =
                    shopd_auth::hash_password(&password).context("password hashing failed")?;

                // Promote in place if the account already exists.
                let user = match shopd_db::users::find_by_email(&pool, &email).await? {
                    Some(existing) => existing,
                    None => {
                        let new = shopd_db::users::NewUser {
                            email: email.clone(),
                            password_hash,
                            name,
                            gender: None,
                            age: None,
                            phone_number: None,
                            address: None,
                        };
                        shopd_db::users::insert_user(&pool, &new)
                            .await
                            .context("admin insert failed")?
                    }
                };

                let profile = shopd_db::users::set_role(&pool, user.user_id, Role::Admin)
                    .await
                    .context("role update failed")?
                    .context("user vanished during promotion")?;

                println!("admin ready: {} ({})", profile.email, profile.user_id);
            }
        },
    }

    Ok(())
}
