use clap::{Parser, Subcommand};
use log::{debug, error, info, warn};

use config::Config;
use storage::MongoDBRepository;

mod commands;

#[derive(Parser, Debug)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

/// JSON arguments are parsed as documents. Leaving one out sends no argument at all.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Insert one record
    Create { record: Option<String> },
    /// Print every record matching the query
    Read { query: Option<String> },
    /// Print the first record matching the query
    ReadOne { query: Option<String> },
    /// Apply an update specification to the matching records
    Update {
        query: Option<String>,
        update: Option<String>,
        /// Update every match instead of the first
        #[arg(short, long)]
        multi: bool,
    },
    /// Delete the matching records
    Delete {
        query: Option<String>,
        /// Delete every match instead of the first
        #[arg(short, long)]
        multi: bool,
    },
    /// Print the distinct values of a field
    Distinct { field: Option<String> },
    /// Print the number of records matching the query
    Count { query: Option<String> },
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    simple_logger::SimpleLogger::new().env().init().unwrap();

    let args = Args::parse();
    debug!("Args: {:?}", args);

    // Load configuration from yaml
    let config = match Config::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config file: {}", e);
            std::process::exit(1);
        }
    };

    let repository = match MongoDBRepository::new(&config.mongo).await {
        Ok(repository) => repository,
        Err(e) => {
            error!("Failed to create repository: {}", e);
            std::process::exit(1);
        }
    };

    let result = commands::run(&repository, args.command, &mut std::io::stdout()).await;
    repository.close().await;

    match result {
        Ok(_) => info!("Done"),
        Err(e) if e.is_handled() => {
            warn!("{}", e);
            std::process::exit(2);
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
