//! Ops command: operator table listing.

use std::fmt::Write;

use anyhow::Result;
use semcore_algebra::OPERATORS;

/// Prints one line per operator: opcode, name, symbol and arity.
pub fn run() -> Result<()> {
    print!("{}", table()?);
    Ok(())
}

fn table() -> Result<String> {
    let mut out = String::new();
    writeln!(out, "{:>6}  {:<18} {:<14} arity", "opcode", "name", "symbol")?;
    for entry in OPERATORS {
        writeln!(
            out,
            "{:>6}  {:<18} {:<14} {}",
            entry.opcode,
            entry.name,
            entry.symbol,
            entry.arity_label()
        )?;
    }
    Ok(out)
}
