use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "nfs4-aclconvert")]
#[command(version)]
#[command(about = "Converts NFSv4 directory ACLs so special principals are inherited", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Walk a directory tree and convert eligible ACLs
    Convert {
        /// Root directory of the tree to walk
        directory: String,

        /// Number of threads for the parallel tree walk
        #[arg(short, long)]
        num_threads: Option<usize>,

        /// Do not modify anything but print the resulting ACLs
        #[arg(short, long)]
        dry_run: bool,
    },
}

pub async fn cli_match() -> utils::error::Result<()> {
    let cli = Cli::parse();

    // Execute the subcommand
    match &cli.command {
        Commands::Convert {
            directory,
            num_threads,
            dry_run,
        } => commands::convert_cmd(directory.clone(), *num_threads, *dry_run).await?,
    }

    Ok(())
}
