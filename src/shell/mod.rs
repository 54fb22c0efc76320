//! Shell Module
//!
//! The command-line front end. Commands are parsed locally and carried out by a
//! running node through its control API, so a shell can drive any node it can
//! reach.
//!
//! - **`commands`**: the command grammar (`put`, `get`, `app`, `cat`, listings,
//!   metadata switching, `kill`) and its usage errors.
//! - **`client`**: `NodeClient`, the HTTP client for the control API.
//!
//! A failing command prints its error and the shell carries on.

pub mod client;
pub mod commands;

pub use client::NodeClient;
pub use commands::{Command, USAGE, UsageError, parse, split_batch};

use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::DfsResult;

pub const PROMPT: &str = "dfs# ";

/// Whether the shell keeps reading commands after one has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Local paths are interpreted relative to the shell, not the node.
fn absolute(path: &str) -> DfsResult<String> {
    let path = Path::new(path);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(absolute.to_string_lossy().into_owned())
}

/// Runs one command against the node, writing its output to `out`.
pub async fn execute(
    client: &NodeClient,
    command: Command,
    out: &mut impl Write,
) -> DfsResult<Flow> {
    match command {
        Command::Put { local, dfs_path } => {
            let source = absolute(&local)?;
            let dfs_path = dfs_path.unwrap_or(local);
            let report = client.put(&source, Some(&dfs_path)).await?;
            writeln!(
                out,
                "{}: {} bytes in {} chunks",
                report.dfs_path, report.total_size, report.chunk_count
            )?;
        }
        Command::Get { dfs_path, local } => {
            let output = absolute(local.as_deref().unwrap_or(&dfs_path))?;
            if !client.get(&dfs_path, &output, false).await? {
                writeln!(out, "could not get {}", dfs_path)?;
            }
        }
        Command::App { dfs_path, local } => {
            let output = absolute(&local)?;
            if !client.get(&dfs_path, &output, true).await? {
                writeln!(out, "could not get {}", dfs_path)?;
            }
        }
        Command::Cat { dfs_path } => match client.cat(&dfs_path).await? {
            Some(contents) => out.write_all(&contents)?,
            None => writeln!(out, "could not get {}", dfs_path)?,
        },
        Command::Ls => {
            for file in client.list_files().await? {
                writeln!(out, "{}", file)?;
            }
        }
        Command::Lsac => {
            for chunk in client.list_all_chunks().await? {
                let holders: Vec<&str> = chunk.holders.iter().map(|n| n.as_str()).collect();
                writeln!(out, "{}: {}", chunk.token, holders.join(" "))?;
            }
        }
        Command::Lslc => {
            for token in client.list_local_chunks().await? {
                writeln!(out, "{}", token)?;
            }
        }
        Command::Lsn => {
            for node in client.list_nodes().await? {
                writeln!(out, "{}", node)?;
            }
        }
        Command::Rmdm { host, port } => {
            if !client.use_remote_metadata(&host, port).await? {
                writeln!(out, "metadata service on {} is not running", host)?;
            }
        }
        Command::Lmdm => {
            if !client.use_local_metadata().await? {
                writeln!(out, "local metadata service is not running")?;
            }
        }
        Command::Kill => {
            client.stop().await?;
            return Ok(Flow::Exit);
        }
        Command::Quit => return Ok(Flow::Exit),
        Command::Help => writeln!(out, "{}", USAGE)?,
    }

    Ok(Flow::Continue)
}

/// Parses and runs one line, reporting usage and command errors to `out`.
pub async fn run_line(client: &NodeClient, line: &str, out: &mut impl Write) -> DfsResult<Flow> {
    let command = match parse(line) {
        Ok(command) => command,
        Err(e) => {
            writeln!(out, "{}", e)?;
            return Ok(Flow::Continue);
        }
    };

    match execute(client, command, out).await {
        Ok(flow) => Ok(flow),
        Err(e) => {
            tracing::debug!("Command {:?} failed: {}", line, e);
            writeln!(out, "error: {}", e)?;
            Ok(Flow::Continue)
        }
    }
}

/// Runs a comma-separated list of commands, stopping early on `quit` or `kill`.
pub async fn run_batch(client: &NodeClient, batch: &str) -> DfsResult<()> {
    let mut stdout = std::io::stdout();
    for line in split_batch(batch) {
        if run_line(client, line, &mut stdout).await? == Flow::Exit {
            break;
        }
    }
    stdout.flush()?;
    Ok(())
}

/// Reads commands from stdin until an empty line, end of input, or `quit`.
pub async fn run_interactive(client: &NodeClient) -> DfsResult<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();

    loop {
        write!(stdout, "{}", PROMPT)?;
        stdout.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            break;
        }
        if run_line(client, &line, &mut stdout).await? == Flow::Exit {
            break;
        }
    }

    writeln!(stdout)?;
    Ok(())
}

#[cfg(test)]
mod tests;
