//! The `slang` command-line entry point: run one or more script files, or
//! fall back to the REPL with no arguments.

use std::env;
use std::fs;
use std::process::ExitCode;

use slang::driver;
use slang::repl;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        match repl::launch() {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("Error: {}", err);
                ExitCode::FAILURE
            }
        }
    } else {
        run_files(&args)
    }
}

fn run_files(paths: &[String]) -> ExitCode {
    let mut status = ExitCode::SUCCESS;
    let mut env = driver::fresh_environment();
    for path in paths {
        let script = match fs::read_to_string(path) {
            Ok(script) => script,
            Err(err) => {
                println!("Error: \"{}\": {}", path, err);
                status = ExitCode::FAILURE;
                continue;
            }
        };
        if let Err(err) = driver::run(&script, &mut env) {
            println!("Error: \"{}\": {}", path, err);
            status = ExitCode::FAILURE;
        }
    }
    status
}
