use clap::Parser;
use listing_harvest::viewer;
use listing_harvest::{HarvestConfig, ResultStore};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

mod args;
use args::{Args, Command, HarvestArgs, ViewArgs};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging, info unless RUST_LOG says otherwise
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command-line arguments
    let args = Args::parse();

    match args.command {
        Command::Harvest(harvest_args) => run_harvest(harvest_args).await,
        Command::View(view_args) => run_view(view_args),
    }
}

async fn run_harvest(args: HarvestArgs) -> ExitCode {
    let config = match &args.config {
        Some(path) => match HarvestConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                ::log::error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => HarvestConfig::default(),
    };
    let config = args.apply(config.with_env_overrides());
    ::log::debug!("Effective configuration: {:?}", config);

    let interrupt = Arc::new(AtomicBool::new(false));
    spawn_interrupt_listener(Arc::clone(&interrupt));

    match listing_harvest::harvest(&config, &args.query(), interrupt).await {
        Ok(summary) => {
            println!("\nDone harvesting!");
            println!("Newly processed listings: {}", summary.new_processed.len());
            println!("Blacklisted listings: {}", summary.blacklisted.len());
            println!("Failed listings: {}", summary.failed.len());
            println!("Already known: {}", summary.skipped);
            println!("Results saved to: {}", summary.results_json_file.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            ::log::error!("Harvest aborted: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// First Ctrl-C stops the harvest at the next step, a second one exits at once
fn spawn_interrupt_listener(interrupt: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            ::log::warn!("Cannot listen for Ctrl-C, interrupts will not save results");
            return;
        }
        ::log::warn!("Interrupt received, saving after the current request (Ctrl-C again to quit now)");
        interrupt.store(true, Ordering::SeqCst);

        if tokio::signal::ctrl_c().await.is_ok() {
            ::log::error!("Second interrupt, exiting without saving");
            std::process::exit(1);
        }
    });
}

fn run_view(args: ViewArgs) -> ExitCode {
    let store = match ResultStore::load(&args.store) {
        Ok(store) => store,
        Err(e) => {
            ::log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let stdout = std::io::stdout();
    match viewer::render(&store, &args.options(), stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => ExitCode::SUCCESS,
        Err(e) => {
            ::log::error!("Failed to render {}: {}", args.store.display(), e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn harvest_args(api_url: &str, store: &std::path::Path) -> HarvestArgs {
        let args = Args::try_parse_from([
            "listing-harvest",
            "harvest",
            "--query",
            "fahrrad",
            "--location",
            "80804",
            "--api-url",
            api_url,
            "--store",
            store.to_str().unwrap(),
        ])
        .unwrap();
        match args.command {
            Command::Harvest(harvest) => harvest,
            Command::View(_) => panic!("expected harvest subcommand"),
        }
    }

    async fn search_server(body: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/inserate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_unsuccessful_search_exits_with_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("results.json");
        let server = search_server(json!({"success": false})).await;

        let code = run_harvest(harvest_args(&server.uri(), &store)).await;

        assert_eq!(code, ExitCode::FAILURE);
        assert!(store.exists());
    }

    #[tokio::test]
    async fn test_empty_search_exits_with_success() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("results.json");
        let server = search_server(json!({"success": true, "data": []})).await;

        let code = run_harvest(harvest_args(&server.uri(), &store)).await;

        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(std::fs::read_to_string(&store).unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_invalid_api_url_exits_with_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("results.json");

        let code = run_harvest(harvest_args("not a url", &store)).await;

        assert_eq!(code, ExitCode::FAILURE);
        assert!(!store.exists());
    }

    #[test]
    fn test_view_missing_store_renders_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args::try_parse_from([
            "listing-harvest",
            "view",
            "--store",
            dir.path().join("none.json").to_str().unwrap(),
        ])
        .unwrap();
        let Command::View(view) = args.command else {
            panic!("expected view subcommand");
        };
        assert_eq!(run_view(view), ExitCode::SUCCESS);
    }
}
