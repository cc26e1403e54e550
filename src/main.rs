mod cli;
mod core;
mod logging;
mod report;
mod server;
mod store;

fn main() -> anyhow::Result<()> {
    cli::run::entry()
}
