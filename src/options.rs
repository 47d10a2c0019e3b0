use async_cron_scheduler::cron::Schedule;
use clap::Parser;
use env_logger::Env;
use miette::{IntoDiagnostic, Result};
use std::str::FromStr;

#[derive(Parser)]
#[clap(version, about, long_about = None)]
pub struct Options {
    /// Increase verbosity, and can be used multiple times
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Cron options for the daily problem push
    #[arg(long, default_value_t = String::from("0 0 9 * * * *"))]
    pub push_cron: String,

    /// Path of the subscriber store file
    #[arg(long, default_value_t = String::from("data/leetcode_subscribers.json"))]
    pub data_file: String,
}

pub fn parse() -> Result<Options> {
    let opts = Options::parse();

    let debug_level = match opts.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(debug_level)).init();

    // check options
    Schedule::from_str(&opts.push_cron).into_diagnostic()?;

    Ok(opts)
}
