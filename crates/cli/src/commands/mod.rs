//! CLI subcommand implementations.

pub mod migrate;
pub mod report;
pub mod sync;

use serde::Serialize;

/// Print a result as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    let rendered = serde_json::to_string_pretty(value)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{rendered}");
    }
    Ok(())
}
