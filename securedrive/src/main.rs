use clap::Parser;
use eyre::{Result, WrapErr};
use serde_json::Value;

use securedrive::{Ledger, MemoryStore, Settings, dispatch};

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "securedrive")]
#[command(about = "Insurance premiums over encrypted vehicle telemetry")]
#[command(version)]
struct Args {
    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Store snapshot read before and written after the call. Overrides
    /// `state_file` from the settings.
    #[arg(long)]
    state: Option<PathBuf>,

    /// Operation name, e.g. `calculateInsurancePremium`
    function: String,

    /// Positional arguments of the operation
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> Result<()> {
    // Log to stderr (if you run with `RUST_LOG=debug`).
    env_logger::init();

    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => Settings::load(path)
            .wrap_err_with(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    let state_file = args.state.clone().or_else(|| settings.state_file.clone());

    let store = MemoryStore::new();
    if let Some(path) = state_file.as_ref().filter(|path| path.exists()) {
        let text = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read state from {}", path.display()))?;
        let snapshot: BTreeMap<String, Value> = serde_json::from_str(&text)?;
        log::debug!("restoring {} entries from {}", snapshot.len(), path.display());
        store.restore(snapshot)?;
    }

    let ledger = Ledger::new(store, settings)?;
    let payload = dispatch(&ledger, &args.function, &args.args)?;
    if !payload.is_empty() {
        println!("{}", String::from_utf8_lossy(&payload));
    }

    if let Some(path) = &state_file {
        let snapshot = ledger.store().snapshot()?;
        fs::write(path, serde_json::to_vec_pretty(&snapshot)?)
            .wrap_err_with(|| format!("failed to write state to {}", path.display()))?;
    }

    Ok(())
}
