//! Expression checking

use anyhow::Result;
use clap::Args;
use fleet_groups::Expression;

/// Arguments for `fleet check`
#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    /// Expression text, e.g. `role == "sensor" and not retired exists`
    pub expression: String,
}

/// Parse the expression and print its canonical form and referenced attributes
pub fn run(args: &CheckArgs) -> Result<()> {
    print!("{}", describe(&args.expression)?);
    Ok(())
}

fn describe(text: &str) -> Result<String> {
    let expression = Expression::parse(text)?;
    let mut attributes = expression.attributes();
    attributes.sort_unstable();
    attributes.dedup();
    Ok(format!(
        "canonical: {expression}\nattributes: {}\n",
        attributes.join(", ")
    ))
}
