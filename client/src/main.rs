use clap::{Parser, Subcommand};
use client::display::render_view;
use client::network::LifeClient;
use log::{info, warn};
use std::time::Duration;
use tokio::time::Instant;

/// Resubscribe well within the server's subscription timeout
const SUBSCRIPTION_REFRESH: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Player identity sent with every request
    #[arg(short = 'p', long, default_value = "anonymous")]
    player: String,

    /// Milliseconds to wait for each response
    #[arg(short = 't', long, default_value = "2000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current board
    State,
    /// Add live cells, given as x,y pairs
    Add {
        #[arg(required = true, value_parser = parse_cell)]
        cells: Vec<(i64, i64)>,
    },
    /// Print the board after every generation until Ctrl+C
    Watch,
    /// Print today's number of distinct players
    Stats,
}

fn parse_cell(value: &str) -> Result<(i64, i64), String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got '{}'", value))?;
    let x = x.trim().parse().map_err(|e| format!("bad x in '{}': {}", value, e))?;
    let y = y.trim().parse().map_err(|e| format!("bad y in '{}': {}", value, e))?;
    Ok((x, y))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let mut client = LifeClient::new(
        &args.server,
        args.player.as_str(),
        Duration::from_millis(args.timeout_ms),
    )
    .await?;

    info!("Talking to {} as {}", client.server_addr(), client.player_id());

    match args.command {
        Command::State => {
            print!("{}", render_view(&client.get_state().await?));
        }

        Command::Add { cells } => {
            let mut last = None;
            for (x, y) in cells {
                match client.add_cell(x, y).await {
                    Ok(view) => last = Some(view),
                    Err(e) if e.is_client_error() => {
                        warn!("Cell ({}, {}) rejected", x, y);
                        break;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            if let Some(view) = last {
                print!("{}", render_view(&view));
            }
        }

        Command::Watch => watch(&mut client).await?,

        Command::Stats => {
            let (date, count) = client.daily_active_users().await?;
            println!("{} daily active users on {}", count, date);
        }
    }

    Ok(())
}

async fn watch(client: &mut LifeClient) -> Result<(), Box<dyn std::error::Error>> {
    client.subscribe().await?;
    let mut subscribed_at = Instant::now();
    print!("{}", render_view(&client.get_state().await?));

    loop {
        let next = tokio::select! {
            next = client.next_generation(SUBSCRIPTION_REFRESH) => next?,
            _ = tokio::signal::ctrl_c() => break,
        };

        if subscribed_at.elapsed() >= SUBSCRIPTION_REFRESH {
            client.subscribe().await?;
            subscribed_at = Instant::now();
        }

        if next.is_some() {
            print!("{}", render_view(&client.get_state().await?));
        }
    }

    client.unsubscribe().await?;
    info!("Unsubscribed");
    Ok(())
}
