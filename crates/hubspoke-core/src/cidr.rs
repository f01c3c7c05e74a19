//! IPv4 CIDR blocks and sequential subnet allocation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CidrError {
    #[error("missing '/' in CIDR '{0}'")]
    MissingPrefix(String),
    #[error("invalid address in CIDR '{0}'")]
    InvalidAddress(String),
    #[error("invalid prefix length in CIDR '{0}'")]
    InvalidPrefix(String),
    #[error("CIDR '{0}' has host bits set")]
    HostBitsSet(String),
}

/// An IPv4 network: base address plus prefix length, with no host bits set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cidr {
    network: u32,
    prefix: u8,
}

fn mask(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix))
    }
}

impl Cidr {
    pub fn new(addr: Ipv4Addr, prefix: u8) -> Result<Self, CidrError> {
        let network = u32::from(addr);
        if prefix > 32 {
            return Err(CidrError::InvalidPrefix(format!("{addr}/{prefix}")));
        }
        if network & !mask(prefix) != 0 {
            return Err(CidrError::HostBitsSet(format!("{addr}/{prefix}")));
        }
        Ok(Self { network, prefix })
    }

    /// Literal constructor for the fixed address plans. Host bits are masked off.
    pub(crate) const fn from_octets(octets: [u8; 4], prefix: u8) -> Self {
        let raw = u32::from_be_bytes(octets);
        let network = if prefix == 0 {
            0
        } else {
            raw & (u32::MAX << (32 - prefix as u32))
        };
        Self { network, prefix }
    }

    pub fn addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.network)
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Number of addresses in the block.
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix))
    }

    fn last(&self) -> u32 {
        // size() - 1 always fits in u32
        self.network | !mask(self.prefix)
    }

    /// True if `other` lies entirely inside this block.
    pub fn contains(&self, other: &Cidr) -> bool {
        other.prefix >= self.prefix && other.network & mask(self.prefix) == self.network
    }

    pub fn overlaps(&self, other: &Cidr) -> bool {
        self.network <= other.last() && other.network <= self.last()
    }

    /// The `index`-th block of length `prefix` inside this one.
    pub fn subnet_at(&self, prefix: u8, index: u32) -> Option<Cidr> {
        if prefix < self.prefix || prefix > 32 {
            return None;
        }
        let count = 1u64 << u32::from(prefix - self.prefix);
        if u64::from(index) >= count {
            return None;
        }
        let step = 1u64 << (32 - u32::from(prefix));
        let network = u64::from(self.network) + u64::from(index) * step;
        Some(Cidr {
            network: network as u32,
            prefix,
        })
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr(), self.prefix)
    }
}

impl FromStr for Cidr {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| CidrError::MissingPrefix(s.to_string()))?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| CidrError::InvalidAddress(s.to_string()))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| CidrError::InvalidPrefix(s.to_string()))?;
        Cidr::new(addr, prefix)
    }
}

impl TryFrom<String> for Cidr {
    type Error = CidrError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Cidr> for String {
    fn from(c: Cidr) -> Self {
        c.to_string()
    }
}

/// Hands out consecutive blocks from a parent range. Each block is aligned to
/// its own size, so a /23 after an odd number of /24s starts one /24 later.
#[derive(Debug, Clone)]
pub struct SubnetAllocator {
    parent: Cidr,
    cursor: u64,
}

impl SubnetAllocator {
    pub fn new(parent: Cidr) -> Self {
        Self {
            parent,
            cursor: u64::from(parent.network),
        }
    }

    /// Take the next block of length `prefix`, or `None` once the parent is exhausted.
    pub fn next_block(&mut self, prefix: u8) -> Option<Cidr> {
        if prefix < self.parent.prefix || prefix > 32 {
            return None;
        }
        let step = 1u64 << (32 - u32::from(prefix));
        let start = self.cursor.div_ceil(step) * step;
        let end = start + step;
        if end > u64::from(self.parent.last()) + 1 {
            return None;
        }
        self.cursor = end;
        Some(Cidr {
            network: start as u32,
            prefix,
        })
    }

    /// Advance past one block of length `prefix` without handing it out.
    /// Returns the skipped block, or `None` if it did not fit.
    #[must_use]
    pub fn skip(&mut self, prefix: u8) -> Option<Cidr> {
        self.next_block(prefix)
    }
}
