mod backends;
mod config;
mod consensus;
mod driver;
mod err;
mod ip_source;
mod options;
mod reconcile;
mod selector;

use std::process::ExitCode;
use std::time::Duration;

use crate::backends::{Backend, Cloudflare};
use crate::config::Config;
use crate::driver::Driver;
use crate::err::*;
use crate::ip_source::SharedSource;
use crate::options::Options;

use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, error, info, warn};
use tracing_subscriber::util::SubscriberInitExt;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Success = 0,
    Config = 1,
    Runtime = 2,
}

impl From<Exit> for ExitCode {
    fn from(code: Exit) -> Self {
        ExitCode::from(code as u8)
    }
}

fn exit_for_clap(kind: clap::error::ErrorKind) -> Exit {
    use clap::error::ErrorKind;

    match kind {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => Exit::Success,
        _ => Exit::Config,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let opts = match Options::try_parse() {
        Ok(opts) => opts,
        Err(e) => {
            let _ = e.print();
            return exit_for_clap(e.kind()).into();
        }
    };

    let mut log_level = tracing::Level::INFO;
    let mut tracing_builder = tracing_subscriber::fmt();

    tracing_builder = if let Some(level) = opts.log_level {
        log_level = level;
        tracing_builder.with_max_level(level)
    } else {
        tracing_builder.with_max_level(log_level)
    };

    if log_level >= tracing::Level::DEBUG {
        tracing_builder = tracing_builder.with_file(true).with_line_number(true);
    };

    tracing_builder.finish().init();

    match app(opts).await {
        Ok(()) => Exit::Success.into(),
        Err(e) if e.is_config() => {
            error!("{}", e);
            Exit::Config.into()
        }
        Err(e) => {
            error!("{}", e);
            Exit::Runtime.into()
        }
    }
}

async fn app(opts: Options) -> Result<()> {
    let config = Config::load(opts)?;
    debug!("The Configuration is: {:?}", config);

    let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
    let provider = Backend::Cloudflare(Cloudflare::new(config.auth.clone(), client.clone()));
    let sources: Vec<SharedSource> = config
        .ip_sources
        .iter()
        .map(|kind| kind.build(&client))
        .collect();

    for (i, source) in sources.iter().enumerate() {
        debug!("IpSource[{}]: {}", i, source.name());
    }

    let driver = Driver::new(&config, &provider, &sources);

    if config.print_only {
        return driver.print_records().await;
    }

    if config.dry_run {
        warn!("Dry run: no record will be modified");
    }

    if config.check_interval == 0 {
        run_once(&driver).await
    } else {
        warn!("Running in blocking mode");
        run_as_blocking(&config, &driver).await
    }
}

async fn run_as_blocking(config: &Config, driver: &Driver<'_, Backend>) -> Result<()> {
    let mut interval =
        tokio::time::interval(tokio::time::Duration::from_secs(config.check_interval));

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    loop {
        tokio::select! {
            _ = sigterm.recv() => { info!("Receive SIGTERM, quit"); return Ok(()) },
            _ = sigint.recv() => { info!("Receive SIGINT, quit"); return Ok(()) },
            _ = interval.tick() => {},
        };

        if let Err(e) = run_once(driver).await {
            error!("[Sync Failed] {}", e);
        }
    }
}

async fn run_once(driver: &Driver<'_, Backend>) -> Result<()> {
    let report = driver.run().await?;

    match report.failures() {
        0 => {
            info!("DNS records are in sync.");
            Ok(())
        }
        failed => Err(AppErr::TargetsFailed {
            failed,
            total: report.targets.len(),
        }),
    }
}
