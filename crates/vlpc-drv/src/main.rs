use std::ffi::OsString;

use clap::Parser;
use vlpc_drv::cli::{normalize_args, Cli};

fn main() {
    tracing_subscriber::fmt::init();

    let args = normalize_args(std::env::args_os().skip(1));
    let cli = Cli::parse_from(std::iter::once(OsString::from("vlpc")).chain(args));

    match vlpc_drv::run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    }
}
