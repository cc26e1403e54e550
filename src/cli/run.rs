use crate::cli::args::{Cli, Commands, GenerateArgs, ParamArgs, PreviewArgs, ServeArgs};
use crate::core::engine;
use crate::core::model::ArtifactKind;
use crate::core::params::ParameterSet;
use crate::logging;
use crate::report::zip::{BundleLayout, bundle_file_name, write_bundle_file};
use crate::server::{self, AppState};
use crate::store::InMemoryConfigStore;
use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::Parser;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub fn entry() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;
    match cli.command {
        Commands::Generate(args) => generate(args),
        Commands::Preview(args) => preview(args),
        Commands::Schema => schema(),
        Commands::Serve(args) => serve(args),
    }
}

fn generate(args: GenerateArgs) -> Result<()> {
    let t0 = Instant::now();
    let params = stage("params", || load_params(&args.params))?;
    let configs = stage("render", || {
        engine::generate_configs(&params).context("failed to render configuration")
    })?;

    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(bundle_file_name(Local::now().naive_local())));
    let layout = BundleLayout::new(&args.static_root);
    let summary = stage("zip", || write_bundle_file(&out, &layout, &configs))?;

    info!(
        out = %out.display(),
        static_files = summary.static_files,
        overridden = summary.overridden,
        generated = summary.generated,
        "bundle written"
    );
    debug!("stage=total time={}", fmt_dur(t0.elapsed()));
    println!("{}", out.display());
    Ok(())
}

fn preview(args: PreviewArgs) -> Result<()> {
    let params = stage("params", || load_params(&args.params))?;
    let content = stage("render", || {
        engine::preview(&args.name, &params)
            .with_context(|| format!("failed to render {}", args.name))
    })?;
    print!("{}", content);
    Ok(())
}

fn schema() -> Result<()> {
    for kind in ArtifactKind::ALL {
        println!("{} ({})", kind.file_name(), kind.path());
        for info in engine::schema(kind) {
            println!("  {:<28} {:<8} {}", info.name, info.kind, info.default);
        }
    }
    Ok(())
}

fn serve(args: ServeArgs) -> Result<()> {
    if !args.static_root.is_dir() {
        bail!("static root is not a directory: {}", args.static_root.display());
    }
    let state = AppState::new(
        Arc::new(InMemoryConfigStore::new()),
        BundleLayout::new(&args.static_root),
    );
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(server::serve(args.bind, state))
}

/// Parameter file first, then `--set` overrides as form-style strings.
fn load_params(args: &ParamArgs) -> Result<ParameterSet> {
    let mut params = match &args.params {
        Some(path) => read_params_file(path)?,
        None => ParameterSet::new(),
    };
    let mut overrides = ParameterSet::new();
    for raw in &args.set_values {
        let (key, value) = parse_assignment(raw)?;
        overrides.insert(key, value);
    }
    params.merge(overrides);
    debug!(count = params.len(), "parameters loaded");
    Ok(params)
}

fn read_params_file(path: &Path) -> Result<ParameterSet> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    ParameterSet::from_value(value).with_context(|| format!("invalid parameters in {}", path.display()))
}

fn parse_assignment(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => bail!("expected KEY=VALUE, got '{}'", raw),
    }
}

fn stage<T, F>(name: &str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let t = Instant::now();
    let res = f();
    debug!("stage={} time={}", name, fmt_dur(t.elapsed()));
    res
}

fn fmt_dur(d: Duration) -> String {
    if d.as_secs_f64() < 1.0 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{:.3}s", d.as_secs_f64())
    }
}
