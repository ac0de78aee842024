#![forbid(unsafe_code)]
//! # danmaku_fetch
//!
//! First stage: asks for a Bilibili video or bangumi URL, downloads its
//! comment feed and writes `danmaku.csv` in the working directory.
//!
//! ## Example
//! ```bash
//! cargo run --release --bin danmaku_fetch -- --url https://www.bilibili.com/video/BV1xx411c7mD
//! ```

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use danmaku_analysis::{BiliClient, Endpoints, ROW_FILE, run_fetch};
use log::{error, info};

#[derive(Parser)]
#[command(author, version, about = "Download Bilibili danmaku into a CSV row file")]
struct Cli {
    /// Video or bangumi URL (prompted for when omitted)
    #[arg(long)]
    url: Option<String>,

    /// Row file to write
    #[arg(long, default_value = ROW_FILE)]
    output: PathBuf,
}

fn prompt_url() -> io::Result<String> {
    print!("Enter a Bilibili video or bangumi URL: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let url = match cli.url {
        Some(url) => url.trim().to_string(),
        None => match prompt_url() {
            Ok(url) => url,
            Err(e) => {
                error!("Could not read URL: {e}");
                process::exit(1);
            }
        },
    };

    info!("Fetching danmaku for {url}");
    let client = match BiliClient::new(Endpoints::default()) {
        Ok(client) => client,
        Err(e) => {
            error!("Error: {e}");
            process::exit(1);
        }
    };

    let saved = run_fetch(&client, &url, &cli.output);
    if saved == 0 {
        error!("No comments saved; {} was not written", cli.output.display());
        process::exit(1);
    }
    println!("Saved {saved} comments to {}", cli.output.display());
}
