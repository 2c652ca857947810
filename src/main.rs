use std::fs::File;
use std::process::ExitCode;

use aurith::Provider;
use aurith::core::config::{self, ResolvedConfig};
use aurith::core::render;
use aurith::core::state::App;
use aurith::core::turn::{Resolution, TurnController};
use aurith::inference::{CompletionService, build_service};
use aurith::tui;
use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(name = "aurith", about = "Terminal chat with the Aurith assistant")]
struct Args {
    /// Completion service to use (overrides config and AURITH_PROVIDER)
    #[arg(short, long, value_enum)]
    provider: Option<Provider>,

    /// Chat endpoint URL (overrides config and AURITH_ENDPOINT_URL)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Ask one question, print the reply, and exit
    #[arg(short, long)]
    ask: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let file_config = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("aurith: {e}");
            return ExitCode::FAILURE;
        }
    };
    let resolved = config::resolve(&file_config, args.provider, args.endpoint.as_deref());

    init_logger(&resolved);
    log::info!(
        "Aurith starting up: provider={:?}, timeout={:?}",
        resolved.provider,
        resolved.request_timeout
    );

    let service = match build_service(&resolved) {
        Ok(service) => service,
        Err(e) => {
            log::warn!("Failed to build completion service: {}", e);
            eprintln!("aurith: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(question) = args.ask {
        return ask_once(service.as_ref(), &resolved, &question).await;
    }

    match tui::run(App::new(service, resolved.persona)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("aurith: terminal error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Writes to aurith.log in the current directory; the TUI owns stdout.
fn init_logger(resolved: &ResolvedConfig) {
    let level = resolved
        .log_level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::Debug);
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    if let Ok(log_file) = File::create("aurith.log") {
        let _ = WriteLogger::init(level, log_config, log_file);
    }
}

/// One turn without the terminal UI. Exits non-zero when the turn fell back.
async fn ask_once(service: &dyn CompletionService, resolved: &ResolvedConfig, question: &str) -> ExitCode {
    let mut controller = TurnController::new(&resolved.persona);
    let Some((resolution, reply)) = controller.converse(service, question).await else {
        eprintln!("aurith: nothing to ask");
        return ExitCode::FAILURE;
    };

    let width = crossterm::terminal::size()
        .map(|(cols, _)| cols as usize)
        .unwrap_or(80);
    let text = render::render(reply.content()).plain_text();
    println!("{}", textwrap::fill(&text, width));

    match resolution {
        Resolution::Replied => ExitCode::SUCCESS,
        Resolution::Fallback | Resolution::Stale => ExitCode::FAILURE,
    }
}
