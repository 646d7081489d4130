//! Machine network interfaces

use std::net::IpAddr;

use crate::error::Result;

/// Source of the addresses bound to this machine
pub trait InterfaceAddrs: Send + Sync {
    /// Every address on every interface (loopback, LAN, VPN)
    fn addrs(&self) -> Result<Vec<IpAddr>>;
}

/// Enumerates interfaces through the operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInterfaces;

impl InterfaceAddrs for SystemInterfaces {
    fn addrs(&self) -> Result<Vec<IpAddr>> {
        let interfaces = if_addrs::get_if_addrs()?;
        Ok(interfaces.iter().map(|iface| iface.ip()).collect())
    }
}

/// Canonical form used for comparisons: IPv4-mapped IPv6 becomes IPv4
pub(crate) fn normalize(ip: IpAddr) -> IpAddr {
    ip.to_canonical()
}
