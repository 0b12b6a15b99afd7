//! Replay change documents against a fresh tree and print what happened.
//!
//! ```text
//! RUST_LOG=debug cargo run -p tw-engine --example replay -- a.json b.json
//! ```
//!
//! Documents are applied in order to the same engine, so later files can
//! modify nodes inserted by earlier ones.

use std::env;
use std::fs;
use std::process::ExitCode;
use tw_engine::{EngineConfig, LayoutEngine};

fn main() -> ExitCode {
    env_logger::init();

    let paths: Vec<String> = env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("usage: replay <change.json>...");
        return ExitCode::FAILURE;
    }

    let config = match env::var("TW_ENGINE_CONFIG") {
        Ok(text) => match EngineConfig::from_json(&text) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("TW_ENGINE_CONFIG: {e}");
                return ExitCode::FAILURE;
            }
        },
        Err(_) => EngineConfig::default(),
    };
    let mut engine = LayoutEngine::new(config);

    let mut skipped = 0;
    for path in &paths {
        let document = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("SKIP {path}: {e}");
                continue;
            }
        };
        match engine.tweak_json(&document) {
            Ok(report) => {
                println!(
                    "{path}: {} applied, {} skipped",
                    report.applied,
                    report.diagnostics.len()
                );
                for d in &report.diagnostics {
                    let who = d.node_id.map(|id| id.to_string()).unwrap_or_default();
                    println!("  [{who}] {}", d.error);
                }
                skipped += report.diagnostics.len();
            }
            Err(e) => {
                eprintln!("FAIL {path}: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    println!(
        "\n{} nodes indexed, {} constraints active, {skipped} skipped",
        engine.registry().len(),
        engine.tree.constraints().filter(|(_, c)| c.active).count()
    );
    for pending in engine.take_pending_images() {
        println!("pending image {} ({:?})", pending.src, pending.slot);
    }
    ExitCode::SUCCESS
}
