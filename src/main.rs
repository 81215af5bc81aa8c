use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use ncloud_mailer::{
    Config,
    compose::Draft,
    email::{
        EmailProvider, EmailProviderConfig,
        providers::{
            ncloud::{
                MAILS_PATH,
                signer::{HEADER_ACCESS_KEY, HEADER_SIGNATURE, HEADER_TIMESTAMP, sign},
            },
            null::NullProvider,
        },
    },
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Global options that apply to all commands
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Overrides app.log_level from the config file
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send an email
    Send {
        /// Recipient address (repeatable)
        #[arg(long, required = true)]
        to: Vec<String>,

        #[arg(long)]
        cc: Vec<String>,

        #[arg(long)]
        bcc: Vec<String>,

        /// Sender address, defaults to email.from_address
        #[arg(long)]
        from: Option<String>,

        /// Sender display name, defaults to email.from_name
        #[arg(long)]
        from_name: Option<String>,

        #[arg(short, long)]
        subject: String,

        /// Plain text body
        #[arg(long)]
        text: Option<String>,

        /// HTML body
        #[arg(long, conflicts_with = "html_file")]
        html: Option<String>,

        /// Read the HTML body from a file
        #[arg(long)]
        html_file: Option<PathBuf>,

        /// File to attach (repeatable)
        #[arg(short, long)]
        attach: Vec<PathBuf>,

        /// Log the message instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Print signed headers for a request, for checking credentials
    Sign {
        #[arg(long, default_value = "POST")]
        method: String,

        /// API path to sign
        #[arg(long, default_value = MAILS_PATH)]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    // Set up logging first
    let log_level = cli.log_level.as_deref().unwrap_or(&config.app.log_level);
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Send {
            to,
            cc,
            bcc,
            from,
            from_name,
            subject,
            text,
            html,
            html_file,
            attach,
            dry_run,
        } => {
            let draft = Draft {
                to,
                cc,
                bcc,
                from,
                from_name,
                subject,
                text,
                html,
                html_file,
                attach,
            };
            let message = draft.into_message(&config.email).await?;

            let provider: Arc<dyn EmailProvider> = if dry_run {
                Arc::new(NullProvider::new())
            } else {
                config.build_provider()?
            };

            info!("Sending via {}", provider.name());
            let result = provider.send_email(message).await?;
            println!(
                "Sent: request id {} ({} recipients accepted)",
                result.request_id, result.accepted_count
            );
        }
        Commands::Sign { method, path } => {
            let EmailProviderConfig::Ncloud(ncloud) = &config.email.provider else {
                return Err("the configured provider does not sign requests".into());
            };
            let credentials = ncloud.credentials()?;
            let method = method.to_uppercase();
            let timestamp = chrono::Utc::now().timestamp_millis();
            let signature = sign(
                &method,
                &path,
                timestamp,
                credentials.access_key(),
                credentials.secret_key(),
            );

            println!("{} {}", method, path);
            println!("{}: {}", HEADER_TIMESTAMP, timestamp);
            println!("{}: {}", HEADER_ACCESS_KEY, credentials.access_key());
            println!("{}: {}", HEADER_SIGNATURE, signature);
        }
    }

    Ok(())
}
