mod git;
mod renderer;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use lanegraph_core::parsers::parse_auto;
use lanegraph_core::{CommitSource, GraphConfig, GraphSession, MemorySource};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::git::GitSource;

const USAGE: &str = "Usage: lanegraph <repo-dir | history.json> [--config file.json] [--svg out.svg]";

/// Rows drawn by `--svg`.
const SVG_ROWS: usize = 40;
const SVG_WIDTH: f64 = 960.0;

struct Args {
    input: PathBuf,
    config: Option<PathBuf>,
    svg: Option<PathBuf>,
}

fn parse_args() -> Option<Args> {
    let mut args = std::env::args().skip(1);
    let mut input = None;
    let mut config = None;
    let mut svg = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(args.next()?)),
            "--svg" => svg = Some(PathBuf::from(args.next()?)),
            _ if arg.starts_with("--") => return None,
            _ if input.is_none() => input = Some(PathBuf::from(arg)),
            _ => return None,
        }
    }
    Some(Args {
        input: input?,
        config,
        svg,
    })
}

fn init_logging() -> Result<()> {
    let path = std::env::var_os("LANEGRAPH_LOG_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("lanegraph.log"));
    let file = File::create(&path).with_context(|| format!("creating log file {}", path.display()))?;
    let filter = EnvFilter::try_from_env("LANEGRAPH_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn open_source(input: &Path) -> Result<Box<dyn CommitSource>> {
    if input.is_dir() {
        let source = GitSource::open(input)
            .with_context(|| format!("{} is not a git repository", input.display()))?;
        return Ok(Box::new(source));
    }
    let data = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let dump = parse_auto(&data).with_context(|| format!("parsing {}", input.display()))?;
    info!(commits = dump.commits.len(), refs = dump.refs.len(), "loaded history dump");
    Ok(Box::new(MemorySource::new(dump)))
}

fn load_config(path: Option<&Path>, fallback: GraphConfig) -> Result<GraphConfig> {
    match path {
        Some(path) => {
            let config = GraphConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?;
            config.validate()?;
            Ok(config)
        }
        None => Ok(fallback),
    }
}

fn open_session(source: &mut dyn CommitSource, config: GraphConfig) -> Result<GraphSession> {
    let refs = source.fetch_refs().context("listing refs")?;
    let total = source.count_commits().context("counting commits")?;
    info!(total, refs = refs.len(), "opening history");
    Ok(GraphSession::new(config, &refs, total)?)
}

/// Load the first rows and write them out as an SVG document.
fn export_svg(source: &mut dyn CommitSource, config: GraphConfig, out: &Path) -> Result<()> {
    let height = SVG_ROWS as f64 * config.row_height;
    let mut session = open_session(source, config)?;
    session.resize(height);
    loop {
        let requests = session.pending_requests();
        if requests.is_empty() {
            break;
        }
        for request in requests {
            let result = source.fetch_commits(request.skip, request.limit);
            session.complete_page(request, result);
        }
    }
    session.flush_frame();
    let viewport = session.viewport(SVG_WIDTH);
    let svg = lanegraph_core::svg::render_svg(
        &session.scene_commands(&viewport),
        SVG_WIDTH,
        height,
        false,
    );
    std::fs::write(out, svg).with_context(|| format!("writing {}", out.display()))?;
    info!(path = %out.display(), "svg written");
    Ok(())
}

fn main() -> Result<()> {
    let Some(args) = parse_args() else {
        eprintln!("{USAGE}");
        std::process::exit(1);
    };
    init_logging()?;

    let mut source = open_source(&args.input)?;
    if let Some(out) = &args.svg {
        let config = load_config(args.config.as_deref(), GraphConfig::default())?;
        return export_svg(source.as_mut(), config, out);
    }

    let config = load_config(args.config.as_deref(), GraphConfig::terminal())?;
    if config.row_height != 1.0 {
        bail!("the terminal view needs row_height = 1");
    }
    let mut session = open_session(source.as_mut(), config)?;
    renderer::run(&mut session, source.as_mut())
}
