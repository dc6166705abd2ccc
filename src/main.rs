use std::process::ExitCode;

fn main() -> ExitCode {
    elevator::logger::init();
    elevator::cli::run()
}
