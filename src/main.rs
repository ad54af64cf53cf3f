use anyhow::Result;
use clap::Parser;
use rspscope::{
    aggregate,
    cli::{Cli, Command, OutputFormat},
    config::RspConfig,
    error::ScopeError,
    html_output::{ChartPage, TimingsChart},
    report::{self, ScopeDump},
    scope_record::ScopeRecord,
    serve,
    stats::{self, TimeUnit},
    stream::ScopeStream,
};
use std::collections::HashSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber (info by default, everything with --debug)
fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let filter = if debug {
        filter.add_directive(tracing::Level::TRACE.into())
    } else {
        filter
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Dump every record, keeping what was printed before a stream error
fn run_echo(file: &Path, format: OutputFormat) -> Result<()> {
    info!("Echoing from file {}", file.display());
    let stream = ScopeStream::open(file)?;
    let stdout = io::stdout();
    let mut dump = ScopeDump::new(stdout.lock(), format);

    let mut failure = None;
    for (index, scope) in stream.enumerate() {
        match scope {
            Ok(scope) => dump.write(index as u64, &scope)?,
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }
    dump.finish()?;

    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn run_scopes(file: &Path, format: OutputFormat) -> Result<()> {
    let counts = aggregate::count_by_tag_in(file)?;
    let sorted = aggregate::sorted_counts(&counts);
    print!("{}", report::render_scope_counts(&sorted, format)?);
    io::stdout().flush()?;
    Ok(())
}

/// Read the records of one tag, failing when there are none
fn load_scope(file: &Path, scope: &str) -> Result<Vec<ScopeRecord>> {
    info!("Analyzing scope {}, from {}", scope, file.display());
    let wanted: HashSet<String> = HashSet::from([scope.to_string()]);
    let mut groups = aggregate::select_by_tag_in(file, &wanted)?;
    let records = aggregate::take_group(&mut groups, scope)?;
    info!("Found {} entries for scope {}", records.len(), scope);
    Ok(records)
}

fn run_percentiles(
    file: &Path,
    scope: &str,
    format: OutputFormat,
    unit: TimeUnit,
) -> Result<()> {
    let records = load_scope(file, scope)?;
    let times = stats::extract_times(&records, unit);
    let tag = scope.to_string();
    let summary = stats::summarize(&times).ok_or(ScopeError::EmptySelection { tag })?;
    print!("{}", report::render_percentiles(scope, unit, &summary, format)?);
    io::stdout().flush()?;
    Ok(())
}

struct TimingsArgs {
    file: PathBuf,
    scope: String,
    output: Option<PathBuf>,
    bind: Option<String>,
    unit: Option<TimeUnit>,
}

fn run_timings(args: TimingsArgs, config: &RspConfig) -> Result<()> {
    let unit = args.unit.unwrap_or(config.unit);
    let records = load_scope(&args.file, &args.scope)?;
    let times = stats::extract_times(&records, unit);
    let percentiles = stats::compute_percentiles(&times);
    debug!(
        p50 = percentiles.p50,
        p95 = percentiles.p95,
        p99 = percentiles.p99,
        "computed percentiles for chart"
    );

    let chart = TimingsChart::new(
        format!("Analysis for scope: {}", args.scope),
        args.scope.as_str(),
        unit,
        times,
    )
    .with_percentiles(percentiles)
    .with_size(config.chart.size());

    let mut page = ChartPage::new();
    page.add_chart(chart);

    if let Some(output) = args.output {
        return serve::save_page(&output, &page);
    }

    serve_page(args.bind.unwrap_or_else(|| config.bind.clone()), &page)
}

#[cfg(feature = "serve")]
fn serve_page(bind: String, page: &ChartPage) -> Result<()> {
    serve::ChartServer::new(bind, page).serve()
}

#[cfg(not(feature = "serve"))]
fn serve_page(bind: String, _page: &ChartPage) -> Result<()> {
    anyhow::bail!(
        "Cannot serve on {}: rsp was built without the serve feature, use --output",
        bind
    )
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    let config = RspConfig::load(args.config.as_deref())?;
    debug!(?config, "loaded configuration");

    match args.command {
        Command::Echo { file, format } => run_echo(&file, format),
        Command::Scopes { file, format } => run_scopes(&file, format),
        Command::Percentiles {
            file,
            scope,
            format,
            unit,
        } => run_percentiles(&file, &scope, format, unit.unwrap_or(config.unit)),
        Command::Timings {
            file,
            scope,
            output,
            bind,
            unit,
        } => run_timings(
            TimingsArgs {
                file,
                scope,
                output,
                bind,
                unit,
            },
            &config,
        ),
    }
}
