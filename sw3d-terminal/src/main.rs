//! SW3D terminal viewer entry point

use anyhow::Result;
use clap::Parser;

use sw3d_terminal::{execute, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    execute(cli)
}
