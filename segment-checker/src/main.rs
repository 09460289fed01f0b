use clap::Parser;
use log::{error, info};
use segment_checker::{cli::Commands, Cli};

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check(args) => {
            if let Err(e) = args.init_log() {
                eprintln!("Failed to initialize log. Cause: {:?}", e);
                // Exit with errno set
                std::process::exit(2);
            }

            match args.run() {
                Ok(tasks) => {
                    for task in &tasks {
                        println!("{}", task);
                    }
                    info!("Segment check produced {} task(s)", tasks.len());
                }
                Err(e) => {
                    error!("Segment check failed: {:?}", e);
                    eprintln!("Segment check failed. Cause: {:?}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
