use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "waitlist-cli")]
#[command(about = "Command-line client for the waitlist API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit an email address to the waitlist
    Join {
        #[arg(short, long)]
        email: String,

        /// One of: student, developer, founder, designer, other
        #[arg(short, long, default_value = "developer")]
        role: String,

        /// Required when --role is "other"
        #[arg(short = 'c', long)]
        custom_role: Option<String>,

        /// Send as this client address (x-forwarded-for)
        #[arg(long)]
        client_ip: Option<String>,
    },
    /// List the accepted roles
    Roles,
    /// Check service and store health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Join {
            email,
            role,
            custom_role,
            client_ip,
        } => {
            let mut body = json!({ "email": email, "role": role });
            if let Some(custom_role) = custom_role {
                body["customRole"] = Value::String(custom_role);
            }

            let mut request = client.post(format!("{}/api/waitlist", base)).json(&body);
            if let Some(ip) = client_ip {
                request = request.header("x-forwarded-for", ip);
            }
            request.send().await?
        }
        Commands::Roles => client.get(format!("{}/api/roles", base)).send().await?,
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", rendered);
    } else {
        eprintln!("Error: waitlist API returned status {}", status);
        eprintln!("{}", rendered);
        std::process::exit(1);
    }
    Ok(())
}
