//! `connretry classify <code>...` – show transient classification per code.

use anyhow::Result;
use connretry_core::config::ConnretryConfig;
use connretry_core::retry::TransientErrorLookup;

pub fn run_classify(cfg: &ConnretryConfig, codes: &[u32]) -> Result<()> {
    let lookup = cfg.transient.to_lookup();
    println!("{:<8} {}", "CODE", "CLASS");
    for code in codes {
        let class = if lookup.is_transient_error(*code) {
            "transient"
        } else {
            "fatal"
        };
        println!("{:<8} {}", code, class);
    }
    Ok(())
}
