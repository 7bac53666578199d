use std::env::args;
use std::process::Command;

use anyhow::{anyhow, ensure, Result};

fn main() -> Result<()> {
    let mut args = args().skip(1);

    match args.next().as_deref() {
        None => default(),
        Some("contacts") => contacts(args),
        Some(name) => Err(anyhow!("Unknown task {}", name)),
    }
}

fn default() -> Result<()> {
    let status = Command::new("cargo").arg("fmt").status()?;

    ensure!(status.success(), "Rustfmt failed with status {:?}", status);

    let status = Command::new("cargo")
        .args(["clippy", "--all-targets"])
        .status()?;

    ensure!(status.success(), "Clippy failed with status {:?}", status);

    let status = Command::new("cargo").arg("test").status()?;

    ensure!(status.success(), "Tests failed with status {:?}", status);

    Ok(())
}

fn contacts(args: impl Iterator<Item = String>) -> Result<()> {
    let status = Command::new("cargo")
        .args(["run", "--bin", "contacts", "--"])
        .args(args)
        .envs([
            ("DATA_PATH", "data"),
            ("RUST_LOG", "info,contact_book=debug,contacts=debug"),
        ])
        .status()?;

    ensure!(status.success(), "Contacts failed with status {:?}", status);

    Ok(())
}
