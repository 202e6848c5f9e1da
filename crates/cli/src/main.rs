use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chatbridge")]
#[command(about = "Rasa chat relay gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the relay server (HTTP + WebSocket on one port).
    Serve {
        /// Config file path (default: CHATBRIDGE_CONFIG_PATH or ~/.chatbridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP and WebSocket port (default from config or 8000)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Chat with the bot through the relay's /chat endpoint (interactive).
    Chat {
        /// Config file path (default: CHATBRIDGE_CONFIG_PATH or ~/.chatbridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Sender id to use (default: let the relay generate one, then keep it).
        #[arg(long, value_name = "ID")]
        sender: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("chatbridge {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("serve failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Chat { config, sender }) => {
            if let Err(e) = run_chat(config, sender).await {
                log::error!("chat failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let mut config = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.server.port = p;
    }
    log::info!(
        "starting relay on {}:{}",
        config.server.bind,
        config.server.port
    );
    lib::gateway::run_server(config).await
}

async fn run_chat(
    config_path: Option<std::path::PathBuf>,
    sender: Option<String>,
) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let config = lib::config::load_config(config_path)?;
    let url = format!("http://127.0.0.1:{}/chat", config.server.port);
    let client = reqwest::Client::new();
    let mut sender = sender;

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if message == "/quit" {
            break;
        }

        let mut body = serde_json::json!({ "message": message });
        if let Some(ref id) = sender {
            body["sender"] = serde_json::Value::String(id.clone());
        }
        let data: serde_json::Value = client.post(&url).json(&body).send().await?.json().await?;

        if data.get("status").and_then(|v| v.as_str()) == Some("success") {
            if sender.is_none() {
                sender = data
                    .get("sender")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string());
            }
            let Some(responses) = data.get("responses").and_then(|v| v.as_array()) else {
                continue;
            };
            for reply in responses {
                if let Some(text) = reply.get("text").and_then(|v| v.as_str()) {
                    println!("{}", text);
                }
                if let Some(image) = reply.get("image").and_then(|v| v.as_str()) {
                    println!("[image] {}", image);
                }
            }
        } else {
            let message = data
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            eprintln!("error: {}", message);
        }
    }
    Ok(())
}
