//! IP address, mask, network and URL values

use crate::error::{ValueError, ValueResult};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use url::Url;

/// A network mask written in dotted form and rendered as bare hex
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpMask {
    bytes: Vec<u8>,
}

impl IpMask {
    /// Mask bytes, 4 for IPv4 and 16 for IPv6
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of leading one bits, or `None` for a non-canonical mask
    pub fn prefix_len(&self) -> Option<u32> {
        let mut ones = 0;
        for b in &self.bytes {
            ones += b.leading_ones();
            if *b != 0xff {
                break;
            }
        }
        let total: u32 = self.bytes.iter().map(|b| b.count_ones()).sum();
        (ones == total).then_some(ones)
    }
}

impl FromStr for IpMask {
    type Err = ValueError;

    fn from_str(s: &str) -> ValueResult<Self> {
        let addr = s
            .parse::<IpAddr>()
            .map_err(|e| ValueError::invalid(s, "ip mask", e))?;
        let bytes = match addr {
            IpAddr::V4(v4) => v4.octets().to_vec(),
            IpAddr::V6(v6) => v6.octets().to_vec(),
        };
        Ok(IpMask { bytes })
    }
}

impl fmt::Display for IpMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.bytes {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// An IP network in CIDR notation, e.g. `192.0.2.0/24`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpNet {
    network: IpAddr,
    prefix: u8,
}

impl IpNet {
    /// Network address with host bits cleared
    pub fn network(&self) -> IpAddr {
        self.network
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix
    }

    /// Whether `addr` falls inside this network
    pub fn contains(&self, addr: &IpAddr) -> bool {
        match (self.network, addr) {
            (IpAddr::V4(net), IpAddr::V4(a)) => {
                mask_v4(u32::from(*a), self.prefix) == u32::from(net)
            }
            (IpAddr::V6(net), IpAddr::V6(a)) => {
                mask_v6(u128::from(*a), self.prefix) == u128::from(net)
            }
            _ => false,
        }
    }
}

fn mask_v4(bits: u32, prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        bits & (u32::MAX << (32 - prefix as u32))
    }
}

fn mask_v6(bits: u128, prefix: u8) -> u128 {
    if prefix == 0 {
        0
    } else {
        bits & (u128::MAX << (128 - prefix as u32))
    }
}

impl FromStr for IpNet {
    type Err = ValueError;

    fn from_str(s: &str) -> ValueResult<Self> {
        const KIND: &str = "ip network";

        let (addr, prefix) = s
            .split_once('/')
            .ok_or_else(|| ValueError::invalid(s, KIND, "missing prefix length"))?;
        let addr = addr
            .parse::<IpAddr>()
            .map_err(|e| ValueError::invalid(s, KIND, e))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| ValueError::invalid(s, KIND, "invalid prefix length"))?;

        let network = match addr {
            IpAddr::V4(v4) if prefix <= 32 => {
                IpAddr::V4(Ipv4Addr::from(mask_v4(u32::from(v4), prefix)))
            }
            IpAddr::V6(v6) if prefix <= 128 => {
                IpAddr::V6(Ipv6Addr::from(mask_v6(u128::from(v6), prefix)))
            }
            _ => return Err(ValueError::out_of_range(s, KIND)),
        };
        Ok(IpNet { network, prefix })
    }
}

impl fmt::Display for IpNet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

pub fn parse_ip(input: &str) -> ValueResult<IpAddr> {
    input
        .parse()
        .map_err(|e| ValueError::invalid(input, "ip", e))
}

pub fn parse_url(input: &str) -> ValueResult<Url> {
    Url::parse(input).map_err(|e| ValueError::invalid(input, "url", e))
}
