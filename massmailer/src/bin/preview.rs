//! MassMailer Preview - page through rendered messages.
//!
//! Renders the template for one row at a time, exactly as it would be sent,
//! and reads `n` / `p` / `q` commands from stdin to move between rows.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use massmailer::cli::{format_preview, init_tracing, open_storage, ComposeArgs};
use massmailer::{translate, Config, Session};

#[derive(Debug, Parser)]
#[command(name = "massmailer-preview", version, about = "Preview mail-merge messages row by row")]
struct Cli {
    #[command(flatten)]
    compose: ComposeArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env();
    init_tracing(config.log_json);
    info!("preview_starting");

    let storage = open_storage(&config)?;
    let mut session = cli.compose.build_session(&storage, &config)?;

    run(&mut session).await
}

async fn run(session: &mut Session) -> Result<()> {
    let locale = session.locale();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match session.preview() {
            Some(preview) => print!("{}", format_preview(&preview, locale)),
            None => {
                println!("{}", translate("no_csv", locale, &[]));
                return Ok(());
            }
        }
        println!("{}", translate("preview_help", locale, &[]));

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };

        match line.trim() {
            "n" | "next" | "" => {
                session.next_preview();
            }
            "p" | "prev" | "previous" => {
                session.previous_preview();
            }
            "q" | "quit" => break,
            _ => {}
        }
    }

    info!("preview_finished");
    Ok(())
}
