use anyhow::Result;
use clap::Args;

#[derive(Args, Default)]
pub struct VersionArgs {
    /// Show detailed version information
    #[arg(long)]
    pub detailed: bool,
}

pub async fn execute(args: VersionArgs) -> Result<()> {
    println!("{} {}", crate::PKG_NAME, crate::VERSION);
    if args.detailed {
        println!("Description: {}", crate::PKG_DESCRIPTION);
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        println!("Rust Edition: 2024");
        println!("Logical CPUs: {}", num_cpus::get());
        println!(
            "Default prime workers: {}",
            crate::parallel::calculate_optimal_workers(0, 75)
        );
    }
    Ok(())
}
