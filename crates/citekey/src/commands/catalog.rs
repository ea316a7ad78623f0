//! Catalog command implementation

use anyhow::Result;

pub fn execute() -> Result<()> {
    print!("{}", citekey_core::catalog::describe());
    Ok(())
}
