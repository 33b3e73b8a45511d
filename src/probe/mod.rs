//! Point-in-time liveness checks.
//!
//! Every signal here is indirect: a foreign process holding the same port, or
//! a command line that happens to match a service's pattern, reads as that
//! service running. Composing several checks under a quorum narrows this but
//! never removes it.

pub mod http;

use crate::process;
use crate::service::ServiceDescriptor;

use async_trait::async_trait;
use futures::future::join_all;
use regex::Regex;
use reqwest::Client;
use std::io::{self, ErrorKind};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpSocket;

#[derive(Clone, Debug)]
pub enum LivenessCheck {
    PortBind(u16),
    ProcessPattern(Regex),
    HttpHealth(String),
}

/// A service counts as running when at least `quorum` of its checks agree.
#[derive(Clone, Debug)]
pub struct Liveness {
    pub checks: Vec<LivenessCheck>,
    pub quorum: usize,
}

impl Liveness {
    /// Port occupancy when the service binds a known port, otherwise a process-table match.
    pub fn primary(port: Option<u16>, pattern: &Regex) -> Self {
        let check = match port {
            Some(port) => LivenessCheck::PortBind(port),
            None => LivenessCheck::ProcessPattern(pattern.clone()),
        };

        Liveness { checks: vec![check], quorum: 1 }
    }
}

#[async_trait]
pub trait Probe: Send + Sync {
    /// Never fails: a probe that cannot query the OS answers `false`.
    async fn is_running(&self, service: &ServiceDescriptor) -> bool;
}

pub struct SystemProbe {
    client: Client,
}

impl SystemProbe {
    pub fn new(health_timeout: Duration) -> Self { SystemProbe { client: http::client(health_timeout) } }

    async fn check(&self, id: &str, check: &LivenessCheck) -> bool {
        match check {
            LivenessCheck::PortBind(port) => port_in_use(*port).await,
            LivenessCheck::ProcessPattern(pattern) => match process::is_alive(pattern).await {
                Ok(alive) => alive,
                Err(err) => {
                    log::warn!("process table query failed for {id}: {err}");
                    false
                }
            },
            LivenessCheck::HttpHealth(url) => http::healthy(&self.client, url).await.unwrap_or(false),
        }
    }
}

#[async_trait]
impl Probe for SystemProbe {
    async fn is_running(&self, service: &ServiceDescriptor) -> bool {
        let checks = service.liveness.checks.iter().map(|check| self.check(&service.id, check));
        let agreeing = join_all(checks).await.into_iter().filter(|alive| *alive).count();

        log::trace!("{} liveness {agreeing}/{} (quorum={})", service.id, service.liveness.checks.len(), service.liveness.quorum);
        agreeing >= service.liveness.quorum
    }
}

/// Addresses a service may listen on. Specific and wildcard binds are both
/// tried because BSD lets a specific bind sit next to a wildcard listener.
fn bind_targets(port: u16) -> [SocketAddr; 4] {
    [
        (Ipv4Addr::LOCALHOST, port).into(),
        (Ipv6Addr::LOCALHOST, port).into(),
        (Ipv4Addr::UNSPECIFIED, port).into(),
        (Ipv6Addr::UNSPECIFIED, port).into(),
    ]
}

fn bind(addr: SocketAddr) -> io::Result<()> {
    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4()?,
        SocketAddr::V6(_) => TcpSocket::new_v6()?,
    };

    // lingering TIME_WAIT sockets from a stopped service must not read as a listener
    #[cfg(unix)]
    socket.set_reuseaddr(true)?;

    socket.bind(addr)
}

/// A port is in use when any loopback or wildcard bind fails with "address in use".
/// Other bind failures, such as a host without IPv6, count as free for that address.
pub async fn port_in_use(port: u16) -> bool {
    for addr in bind_targets(port) {
        match bind(addr) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::AddrInUse => return true,
            Err(err) if addr.is_ipv6() => log::debug!("cannot probe {addr}: {err}"),
            Err(err) => log::warn!("cannot probe {addr}: {err}"),
        }
    }

    false
}
