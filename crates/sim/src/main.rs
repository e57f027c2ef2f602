//! `mmu-sim`: runs a mapping and access scenario against the MMU model.

mod config;
mod console;
mod sim;
mod workload;

use std::process::ExitCode;

use clap::Parser;

use crate::{
    config::{Args, Scenario},
    console::Console,
    sim::Simulation,
};

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(error) = Console::init(console::level_for(args.verbose)) {
        eprintln!("failed to install logger: {}", error);
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!("{}", error);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = Scenario::load(args)?;
    let mut sim = Simulation::new(&scenario, args.max_cycles)?;
    let summary = sim.run()?;
    summary.log();
    Ok(())
}
