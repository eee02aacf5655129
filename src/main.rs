// src/main.rs

use pancake::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("pancake: failed to initialise logging: {err:#}");
    }

    if let Err(err) = run(args).await {
        match &err {
            pancake::PancakeError::RuleExecution(failure) => {
                for line in failure.detail() {
                    eprintln!("{line}");
                }
            }
            other => eprintln!("pancake: {other}"),
        }
        std::process::exit(1);
    }
}
