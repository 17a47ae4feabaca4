use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an admin account, or promote and re-key an existing one.
    CreateAdmin {
        email: String,
        password: String,
        #[arg(default_value = "Admin")]
        name: String,
    },
    /// Set a new password on an existing admin account.
    UpdateAdminPassword { email: String, password: String },
    /// Remove an account and its indexes entirely.
    DeleteUser { email: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Command::CreateAdmin {
            email,
            password,
            name,
        } => ops::create_admin(&email, &password, &name).await,
        Command::UpdateAdminPassword { email, password } => {
            ops::update_admin_password(&email, &password).await
        }
        Command::DeleteUser { email } => ops::delete_user(&email).await,
    }
}
