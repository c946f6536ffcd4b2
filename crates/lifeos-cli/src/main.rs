use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "lifeos", version, about = "LifeOS dashboard CLI")]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Exam study plan
    Academics {
        #[command(subcommand)]
        action: commands::academics::AcademicsAction,
    },
    /// Income, expenses and investments
    Finance {
        #[command(subcommand)]
        action: commands::finance::FinanceAction,
    },
    /// Daily health checklist
    Health {
        #[command(subcommand)]
        action: commands::health::HealthAction,
    },
    /// Focus timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Servo gauge
    Servo {
        #[command(subcommand)]
        action: commands::servo::ServoAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("LIFEOS_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let out = commands::Output { json: cli.json };
    let result = match cli.command {
        Commands::Academics { action } => commands::academics::run(action, out),
        Commands::Finance { action } => commands::finance::run(action, out),
        Commands::Health { action } => commands::health::run(action, out),
        Commands::Timer { action } => commands::timer::run(action, out),
        Commands::Servo { action } => commands::servo::run(action, out),
        Commands::Config { action } => commands::config::run(action, out),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
