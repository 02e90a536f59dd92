//! `clap` value parsers for CLI-supplied adapter targets.
//!
//! Each returns the parsed/validated value itself (not just `Result<(), _>`)
//! so they plug directly into `#[arg(value_parser = ...)]`, unlike the
//! teacher's `&str -> Result<(), String>` validator shape from an older
//! clap generation.

use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::Path;

/// Rejects a string that isn't a valid IPv4 address, for adapters bound to
/// a specific interface.
pub fn is_ip_addr(ip: &str) -> Result<Ipv4Addr, String> {
    ip.parse::<Ipv4Addr>().map_err(|_| format!("'{ip}' is not a valid IPv4 address"))
}

/// Rejects a string that isn't a valid `ip:port` IPv4 socket address.
pub fn is_socket_addr(socket: &str) -> Result<SocketAddrV4, String> {
    socket
        .parse::<SocketAddrV4>()
        .map_err(|_| format!("'{socket}' is not a valid IPv4 socket address"))
}

pub fn is_port(port: &str) -> Result<u16, String> {
    port.parse::<u16>().map_err(|_| format!("'{port}' is not a valid port"))
}

/// Rejects a path that already exists on disk, for outputs that must not
/// clobber an existing file.
pub fn is_path(path: &str) -> Result<String, String> {
    if Path::new(path).exists() {
        Err(format!("'{path}' already exists on disk"))
    } else {
        Ok(path.to_owned())
    }
}

/// Rejects a path that doesn't exist on disk, for adapters that tail or
/// replay a specific file.
pub fn is_file(path: &str) -> Result<String, String> {
    if Path::new(path).exists() {
        Ok(path.to_owned())
    } else {
        Err(format!("'{path}' does not exist on disk"))
    }
}
