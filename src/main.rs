use std::process::ExitCode;
use std::sync::Arc;

use ofcp::args::print_usage;
use ofcp::{
    clamp_exit_code, CancelSignal, ConsoleReporter, Controller, CopyError, CopyOptions,
    CopyOutcome, EXIT_CANCELLED,
};

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("ofcp");

    let options = match CopyOptions::parse(args.clone()) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            print_usage(program);
            return ExitCode::from(e.exit_code());
        }
    };

    // The notification is created here and handed to both the signal handler
    // and the controller's wait; there is no process-wide cancel state.
    let cancel = CancelSignal::new();
    if let Err(e) = cancel.install() {
        let err = CopyError::SignalSetupFailed(e);
        eprintln!("ERROR: {}", err);
        return ExitCode::from(err.exit_code());
    }

    let controller = Controller::new(options);
    match controller.run(&cancel, Arc::new(ConsoleReporter)) {
        Ok(CopyOutcome::Succeeded) => ExitCode::SUCCESS,
        Ok(CopyOutcome::Cancelled) => ExitCode::from(EXIT_CANCELLED),
        Ok(CopyOutcome::Failed(code)) => ExitCode::from(clamp_exit_code(code)),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
