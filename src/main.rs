#![allow(non_upper_case_globals)]
extern crate anyhow;
extern crate clap;
extern crate serde;
extern crate serde_json;
extern crate thiserror;
extern crate walkdir;

#[macro_export]
macro_rules! if_tracing {
    {$($body:tt)*} => {
        ::cfg_if::cfg_if! {
            if #[cfg(feature = "tracing")] {
                $($body)*
            }
        }
    };
}

if_tracing! {
    use tracing_subscriber::{EnvFilter, fmt};
}

use crate::cli::{Cli, Command};
use clap::Parser;
use std::process;

mod algorithms;
mod cli;
mod error;
mod mutator;
mod registered;


fn main() {
    if_tracing! {
        let subscriber = fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(false)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Encode(args) => cli::encode::encode(args),
        Command::Decode(args) => cli::decode::decode(args),
        Command::Test(args) => cli::test::test(args),
        Command::Corpus(args) => cli::corpus::corpus(args),
        Command::Pipeline(command) => cli::pipeline::pipeline(command),
    };

    if let Err(e) = result {
        if_tracing! {
            tracing::error!(error = %e, "command failed");
        }
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
