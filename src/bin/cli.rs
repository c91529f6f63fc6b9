//! QueueKV CLI Client
//!
//! Sends key-value commands to the queue. Results are not returned to the
//! client; they appear in the server's log.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use queuekv::producer::is_valid_input;
use queuekv::{logging, Action, Config, Producer, TcpQueue};

/// QueueKV CLI
#[derive(Parser, Debug)]
#[command(name = "queuekv-cli")]
#[command(about = "CLI for the QueueKV key-value store")]
struct Args {
    /// JSON config file (queueName, ...)
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Broker address (host:port), overrides the config file
    #[arg(short, long)]
    broker: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add or overwrite a key
    Add {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Delete {
        /// The key to delete
        key: String,
    },

    /// Log the value of a key on the server
    Get {
        /// The key to get
        key: String,
    },

    /// Log every key on the server, in insertion order
    All,

    /// Interactive menu
    Shell,
}

fn main() {
    if let Err(e) = logging::init(None, "warn") {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let args = Args::parse();

    let mut config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(broker) = args.broker {
        config.broker_addr = broker;
    }

    let transport = Arc::new(TcpQueue::new(&config.broker_addr, &config.queue_name));
    let producer = Producer::new(transport, &config.group_id);

    let result = match args.command {
        Commands::Add { key, value } => producer.add_item(&key, &value),
        Commands::Delete { key } => producer.delete_item(&key),
        Commands::Get { key } => producer.get_item(&key),
        Commands::All => producer.get_all_items(),
        Commands::Shell => {
            run_shell(&producer);
            Ok(())
        }
    };

    match result {
        Ok(()) => {}
        Err(e) => {
            eprintln!("Got an error sending the message: {}", e);
            std::process::exit(1);
        }
    }
}

/// Numbered menu loop; returns on choice 5 or end of input
fn run_shell(producer: &Producer) {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        println!("Please Choose an Action");
        println!("------------------------");
        println!("1. Add Item");
        println!("2. Delete Item");
        println!("3. Get Item");
        println!("4. Get All Items");
        println!("5. Exit");

        let choice = match prompt(&mut lines, "Please Make a Choice(1-5)-> ") {
            Some(choice) => choice,
            None => return,
        };

        let (action, key, value) = match choice.as_str() {
            "1" => {
                let Some(key) = prompt_key(&mut lines, "Add") else { return };
                if key.is_empty() {
                    continue;
                }
                let Some(value) = prompt(&mut lines, "Please Enter the Value for the Item to Add -> ") else {
                    return;
                };
                if !is_valid_input(&value) {
                    println!("Value must contain only alphanumeric characters.");
                    continue;
                }
                (Action::AddItem, key, value)
            }
            "2" => match prompt_key(&mut lines, "Delete") {
                Some(key) => (Action::DeleteItem, key, String::new()),
                None => return,
            },
            "3" => match prompt_key(&mut lines, "Get") {
                Some(key) => (Action::GetItem, key, String::new()),
                None => return,
            },
            "4" => (Action::GetAllItems, String::new(), String::new()),
            "5" => return,
            _ => {
                println!("Please Make a Valid Choice(1-5)");
                continue;
            }
        };

        if key.is_empty() && action.requires_key() {
            continue;
        }

        match producer.send(action, &key, &value) {
            Ok(()) => println!("Sent message to queue"),
            Err(e) => println!("Got an error sending the message: {}", e),
        }
    }
}

/// Ask for a key; an invalid key prints the reason and yields an empty key
fn prompt_key<B: BufRead>(lines: &mut io::Lines<B>, verb: &str) -> Option<String> {
    let key = prompt(lines, &format!("Please Enter the Key for the Item to {} -> ", verb))?;

    if key.is_empty() {
        println!("Key cannot be empty.");
        return Some(String::new());
    }
    if !is_valid_input(&key) {
        println!("Key must contain only alphanumeric characters.");
        return Some(String::new());
    }
    Some(key)
}

/// Print a prompt and read one trimmed line; None at end of input
fn prompt<B: BufRead>(lines: &mut io::Lines<B>, text: &str) -> Option<String> {
    print!("{}", text);
    let _ = io::stdout().flush();
    lines.next()?.ok().map(|line| line.trim().to_string())
}
