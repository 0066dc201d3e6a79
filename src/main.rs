use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};

use fieldrender_lib::commands;

const USAGE: &str = "usage: fieldrender <config-file>\n       fieldrender init <config-file>";

fn run(args: &[String]) -> Result<serde_json::Value> {
    match args {
        [cmd, path] if cmd == "init" => commands::config::init_config(&PathBuf::from(path)),
        [path] => commands::render::render_from_config(&PathBuf::from(path)),
        _ => bail!("{}", USAGE),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(summary) => {
            match serde_json::to_string_pretty(&summary) {
                Ok(text) => println!("{}", text),
                Err(_) => println!("{}", summary),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", commands::helpers::map_anyhow(e));
            ExitCode::FAILURE
        }
    }
}
