//! Discovery of the embedded analytics-server process and its port.
//!
//! Power BI Desktop launches a private `msmdsrv` instance listening on an
//! ephemeral loopback port. We find the process by name with `sysinfo`, then
//! join its open socket inodes (`/proc/<pid>/fd`) against the kernel socket
//! table (`/proc/<pid>/net/tcp`) to recover the listening port.

use crate::{Error, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use sysinfo::System;

/// Process name fragment identifying the analytics server.
pub const SERVER_PROCESS_NAME: &str = "msmdsrv";

/// Loopback address as it appears in the kernel socket table.
const LOOPBACK_HEX: &str = "0100007F";

/// TCP state code for LISTEN.
const STATE_LISTEN: &str = "0A";

/// A discovered analytics-server instance.
#[derive(Debug, Clone)]
pub struct LocatedServer {
    /// Loopback port the instance is listening on.
    pub port: u16,
    /// Path to the server executable, when readable.
    pub exe: Option<PathBuf>,
}

/// Finds a running analytics-server instance.
///
/// # Errors
///
/// Returns [`Error::ProcessNotFound`] when no matching process with a
/// loopback listening socket exists.
pub fn locate() -> Result<LocatedServer> {
    let system = System::new_all();

    for (pid, process) in system.processes() {
        let name = process.name().to_string_lossy().to_lowercase();
        if !name.contains(SERVER_PROCESS_NAME) {
            continue;
        }

        let pid = pid.as_u32();
        tracing::debug!(pid, %name, "Inspecting analytics-server candidate");

        // Processes we cannot inspect (permissions, races) are skipped, not fatal.
        let inodes = match socket_inodes(pid) {
            Ok(inodes) => inodes,
            Err(e) => {
                tracing::debug!(pid, error = %e, "Cannot read process sockets, skipping");
                continue;
            }
        };

        let table = match std::fs::read_to_string(format!("/proc/{pid}/net/tcp")) {
            Ok(table) => table,
            Err(e) => {
                tracing::debug!(pid, error = %e, "Cannot read socket table, skipping");
                continue;
            }
        };

        if let Some(port) = listening_loopback_port(&table, &inodes) {
            let exe = process.exe().map(Path::to_path_buf);
            tracing::info!(pid, port, "Located analytics server");
            return Ok(LocatedServer { port, exe });
        }
    }

    Err(Error::ProcessNotFound(
        "no running instance with an open model was found".to_string(),
    ))
}

/// Collects the socket inodes held open by a process.
fn socket_inodes(pid: u32) -> std::io::Result<HashSet<u64>> {
    let mut inodes = HashSet::new();
    for entry in std::fs::read_dir(format!("/proc/{pid}/fd"))? {
        let Ok(entry) = entry else { continue };
        let Ok(target) = std::fs::read_link(entry.path()) else {
            continue;
        };
        let target = target.to_string_lossy();
        if let Some(inode) = target
            .strip_prefix("socket:[")
            .and_then(|s| s.strip_suffix(']'))
            .and_then(|s| s.parse::<u64>().ok())
        {
            inodes.insert(inode);
        }
    }
    Ok(inodes)
}

/// Finds the first loopback LISTEN port in a socket table owned by `inodes`.
fn listening_loopback_port(table: &str, inodes: &HashSet<u64>) -> Option<u16> {
    table
        .lines()
        .skip(1)
        .filter_map(parse_socket_line)
        .find(|entry| entry.listening && entry.loopback && inodes.contains(&entry.inode))
        .map(|entry| entry.port)
}

/// One parsed row of `/proc/<pid>/net/tcp`.
#[derive(Debug, PartialEq, Eq)]
struct SocketEntry {
    loopback: bool,
    listening: bool,
    port: u16,
    inode: u64,
}

/// Parses a single socket-table line.
///
/// Expected format (whitespace separated):
/// `sl local_address rem_address st tx_queue:rx_queue tr:tm->when retrnsmt uid timeout inode`
fn parse_socket_line(line: &str) -> Option<SocketEntry> {
    let mut fields = line.split_whitespace();
    let local_address = fields.nth(1)?;
    let state = fields.nth(1)?;
    let inode = fields.nth(5)?.parse::<u64>().ok()?;

    let (address, port_hex) = local_address.split_once(':')?;
    let port = u16::from_str_radix(port_hex, 16).ok()?;

    Some(SocketEntry {
        loopback: address == LOOPBACK_HEX,
        listening: state == STATE_LISTEN,
        port,
        inode,
    })
}
