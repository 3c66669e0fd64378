//! Murmur peer-to-peer group chat.

use std::{net::Ipv4Addr, process::ExitCode};

use clap::Parser;
use murmur_cli::{
    Args, CliError, Command, commands,
    config::{KeyNotice, setup_logging},
    display::{Console, format_delivered, format_peers, format_send_result},
};
use murmur_core::{Session, UdpTransport};
use rand::rngs::OsRng;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = setup_logging(&args.log_level, args.log_format) {
        Console.error(&e.to_string());
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "murmur stopped");
            ExitCode::FAILURE
        },
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let console = Console;

    let (config, notice) = args.session_config(&mut OsRng)?;
    match notice {
        KeyNotice::None => {},
        KeyNotice::GeneratedSharedKey(hex) => {
            console.line("No passphrase or key given; generated a shared key for this chat.");
            console.line(&format!("Share it with every peer (--key): {hex}"));
        },
        KeyNotice::PublicKey(pem) => {
            if args.public_key_out.is_none() {
                console.line("Our public key (peers pass it with --peer-key):");
                console.line(pem.trim_end());
            }
        },
    }

    let transport = UdpTransport::bind((Ipv4Addr::UNSPECIFIED, args.port)).await?;
    let session = Session::new(transport, config)?;
    let clock = session.clock();
    let directory = session.directory();

    info!(alias = %args.alias, port = args.port, "listening");

    let (events, mut inbox) = mpsc::channel(64);
    let (mut sender, receiver_task) = session.spawn(events);

    tokio::spawn(async move {
        while let Some(delivered) = inbox.recv().await {
            Console.line(&format_delivered(&delivered));
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match commands::parse(&line) {
            Command::Quit => break,
            Command::Clock => console.line(&format!("lamport {}", clock.current())),
            Command::Peers => console.line(&format_peers(&directory)),
            Command::Unknown { input } => console.line(&format!("unknown command: {input}")),
            Command::Message { content } if content.is_empty() => {},
            Command::Message { content } => {
                let result = sender.send(&content).await;
                if let Err(e) = &result {
                    warn!(error = %e, recoverable = e.is_recoverable(), "message not sent");
                }
                if let Some(line) = format_send_result(&result) {
                    console.line(&line);
                }
            },
        }
    }

    receiver_task.abort();
    info!("bye");
    Ok(())
}
