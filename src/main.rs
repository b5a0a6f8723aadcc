use anyhow::Result;
use clap::Parser;
use photo_challenge::{app::App, image::load_image, prompts};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "photo-challenge")]
#[command(about = "Play the household photo challenge game from the terminal")]
struct CliArgs {
    /// Print the game rules and exit.
    #[arg(long)]
    rules: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Quit,
    Submit(PathBuf, PathBuf),
    Usage(&'static str),
    Say(String),
}

const SUBMIT_USAGE: &str = "usage: /submit <image1> <image2>";

fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    let mut words = trimmed.split_whitespace();

    match words.next() {
        Some("/quit") | Some("/exit") => Command::Quit,
        Some("/new") => Command::Say("אתגר חדש".to_string()),
        Some("/rules") => Command::Say("כללים".to_string()),
        Some("/submit") => match (words.next(), words.next(), words.next()) {
            (Some(first), Some(second), None) => {
                Command::Submit(PathBuf::from(first), PathBuf::from(second))
            }
            _ => Command::Usage(SUBMIT_USAGE),
        },
        _ => Command::Say(trimmed.to_string()),
    }
}

async fn load_optional(path: &Path) -> Option<image::DynamicImage> {
    match load_image(path).await {
        Ok(image) => Some(image),
        Err(e) => {
            warn!("Could not open {}: {}", path.display(), e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "photo_challenge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();
    if args.rules {
        println!("{}", prompts::RULES.trim_end());
        return Ok(());
    }

    info!("Starting photo-challenge");

    let mut app = match App::new() {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let reply = match parse_command(&line) {
            Command::Quit => break,
            Command::Usage(usage) => usage.to_string(),
            Command::Say(message) if message.is_empty() => continue,
            Command::Say(message) => app.send(&message).await,
            Command::Submit(first, second) => {
                let (image1, image2) = tokio::join!(load_optional(&first), load_optional(&second));
                app.submit_images(image1.as_ref(), image2.as_ref()).await
            }
        };
        println!("{}\n", reply);
    }

    info!("Session ended");
    Ok(())
}
