//! cinnabar CLI Client
//!
//! Command-line interface for issuing commands against a server.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use cinnabar::{Client, CinnabarError, Config};

/// cinnabar CLI
#[derive(Parser, Debug)]
#[command(name = "cinnabar-cli")]
#[command(about = "CLI for the cinnabar key-value store client")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "6379")]
    port: u16,

    /// Authentication password
    #[arg(long)]
    password: Option<String>,

    /// Send timeout in milliseconds (0 = no timeout)
    #[arg(long, default_value = "0")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Test whether a key exists
    Exists {
        /// The key to test
        key: String,
    },

    /// Increment the integer value of a key
    Incr {
        /// The key to increment
        key: String,
    },

    /// List keys matching a glob pattern
    Keys {
        /// The pattern to match
        #[arg(default_value = "*")]
        pattern: String,
    },

    /// Ping the server
    Ping,

    /// Print server information
    Info,

    /// Send a raw command line and print the reply
    Raw {
        /// The command text, e.g. "TTL mykey"
        command: Vec<String>,
    },
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,cinnabar=info"));

    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();

    let mut builder = Config::builder()
        .host(args.host.as_str())
        .port(args.port)
        .send_timeout_ms(args.timeout_ms);
    if let Some(password) = &args.password {
        builder = builder.password(password.as_str());
    }

    let mut client = Client::new(builder.build());

    match run(&mut client, args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CinnabarError::Server(e)) => {
            eprintln!("(error) {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(client: &mut Client, command: Commands) -> cinnabar::Result<()> {
    match command {
        Commands::Get { key } => match client.get_string(&key)? {
            Some(value) => println!("{}", value),
            None => println!("(nil)"),
        },
        Commands::Set { key, value } => {
            client.set_string(&key, &value)?;
            println!("OK");
        }
        Commands::Del { key } => {
            let removed = client.del(&key)?;
            println!("{}", if removed { 1 } else { 0 });
        }
        Commands::Exists { key } => {
            let present = client.exists(&key)?;
            println!("{}", if present { 1 } else { 0 });
        }
        Commands::Incr { key } => {
            println!("{}", client.incr(&key)?);
        }
        Commands::Keys { pattern } => {
            for name in client.keys_matching(&pattern)? {
                println!("{}", name);
            }
        }
        Commands::Ping => {
            println!("{}", client.ping()?);
        }
        Commands::Info => {
            let mut pairs: Vec<_> = client.info()?.into_iter().collect();
            pairs.sort();
            for (name, value) in pairs {
                println!("{}: {}", name, value);
            }
        }
        Commands::Raw { command } => {
            println!("{}", client.raw_command(&command.join(" "))?);
        }
    }
    Ok(())
}
