use std::any::Any;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::error::ScanfigError;
use crate::setter::{Setter, SetterCreator};
use crate::slot::Slot;
use crate::types::{Tags, keys};
use crate::validate::allow_deny;

const IP: &str = "ip address";
const NETWORK: &str = "ip network";

/// An IP network in CIDR form. Host bits are always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpNetwork {
    addr: IpAddr,
    prefix: u8,
}

impl IpNetwork {
    /// Build a network, masking off host bits. Returns `None` if the prefix
    /// is longer than the address.
    pub fn new(addr: IpAddr, prefix: u8) -> Option<Self> {
        let addr = addr.to_canonical();
        let addr = match addr {
            IpAddr::V4(v4) if prefix <= 32 => IpAddr::V4(Ipv4Addr::from(
                u32::from(v4) & v4_mask(prefix),
            )),
            IpAddr::V6(v6) if prefix <= 128 => IpAddr::V6(Ipv6Addr::from(
                u128::from(v6) & v6_mask(prefix),
            )),
            _ => return None,
        };
        Some(IpNetwork { addr, prefix })
    }

    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.addr, ip.to_canonical()) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                u32::from(ip) & v4_mask(self.prefix) == u32::from(net)
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                u128::from(ip) & v6_mask(self.prefix) == u128::from(net)
            }
            _ => false,
        }
    }
}

fn v4_mask(prefix: u8) -> u32 {
    u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0)
}

fn v6_mask(prefix: u8) -> u128 {
    u128::MAX.checked_shl(128 - u32::from(prefix)).unwrap_or(0)
}

impl Default for IpNetwork {
    fn default() -> Self {
        IpNetwork {
            addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            prefix: 0,
        }
    }
}

impl fmt::Display for IpNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

impl FromStr for IpNetwork {
    type Err = ScanfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || ScanfigError::conversion(text, NETWORK);
        let (addr, prefix) = text.trim().split_once('/').ok_or_else(invalid)?;
        if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let addr: IpAddr = addr.parse().map_err(|_| invalid())?;
        let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
        IpNetwork::new(addr, prefix).ok_or_else(invalid)
    }
}

const CLASSES: &[(&str, fn(&IpAddr) -> bool)] = &[
    ("global unicast", is_global_unicast),
    ("interface local multicast", is_interface_local_multicast),
    ("link local multicast", is_link_local_multicast),
    ("link local unicast", is_link_local_unicast),
    ("loopback", IpAddr::is_loopback),
    ("multicast", IpAddr::is_multicast),
    ("unspecified", IpAddr::is_unspecified),
];

fn is_link_local_unicast(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_link_local(),
        IpAddr::V6(v6) => v6.segments()[0] & 0xffc0 == 0xfe80,
    }
}

fn is_link_local_multicast(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.octets()[..3] == [224, 0, 0],
        IpAddr::V6(v6) => v6.segments()[0] & 0xff0f == 0xff02,
    }
}

fn is_interface_local_multicast(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(_) => false,
        IpAddr::V6(v6) => v6.segments()[0] & 0xff0f == 0xff01,
    }
}

fn is_global_unicast(ip: &IpAddr) -> bool {
    let broadcast = matches!(ip, IpAddr::V4(v4) if v4.is_broadcast());
    !(broadcast
        || ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_multicast()
        || is_link_local_unicast(ip))
}

fn class(name: &str) -> Result<fn(&IpAddr) -> bool, ScanfigError> {
    CLASSES
        .iter()
        .find(|(class, _)| *class == name)
        .map(|(_, test)| *test)
        .ok_or_else(|| {
            ScanfigError::invalid_constraint(keys::IS, name, "unrecognized address class")
        })
}

fn check_version(ip: &IpAddr, tags: &Tags, shown: &str) -> Result<(), ScanfigError> {
    let Some(version) = tags.get(keys::VERSION) else {
        return Ok(());
    };
    let wanted_v4 = match version {
        "4" => true,
        "6" => false,
        other => {
            return Err(ScanfigError::invalid_constraint(
                keys::VERSION,
                other,
                "expected 4 or 6",
            ));
        }
    };
    if ip.is_ipv4() == wanted_v4 {
        Ok(())
    } else {
        Err(ScanfigError::validation(
            shown,
            format!("{ip} is not an IPv{version} address"),
        ))
    }
}

fn check_classes(ip: &IpAddr, tags: &Tags, shown: &str) -> Result<(), ScanfigError> {
    let Some(list) = tags.get(keys::IS) else {
        return Ok(());
    };
    let (allow, deny) = allow_deny(list);
    let allow = allow
        .into_iter()
        .map(|name| Ok((name, class(name)?)))
        .collect::<Result<Vec<_>, ScanfigError>>()?;
    let deny = deny
        .into_iter()
        .map(|name| Ok((name, class(name)?)))
        .collect::<Result<Vec<_>, ScanfigError>>()?;

    if let Some((name, _)) = deny.iter().find(|(_, test)| test(ip)) {
        return Err(ScanfigError::validation(shown, format!("{ip} can not be {name}")));
    }
    if allow.is_empty() || allow.iter().any(|(_, test)| test(ip)) {
        return Ok(());
    }
    let names: Vec<_> = allow.iter().map(|(name, _)| *name).collect();
    Err(ScanfigError::validation(
        shown,
        format!("{ip} did not match any allowed class ({})", names.join(",")),
    ))
}

fn check_networks(ip: &IpAddr, tags: &Tags, shown: &str) -> Result<(), ScanfigError> {
    let Some(list) = tags.get(keys::NET) else {
        return Ok(());
    };
    let parse = |cidr: &str| {
        cidr.parse::<IpNetwork>()
            .map_err(|_| ScanfigError::invalid_constraint(keys::NET, cidr, "not a valid ip network"))
    };
    let (allow, deny) = allow_deny(list);
    let allow = allow.into_iter().map(parse).collect::<Result<Vec<_>, _>>()?;
    let deny = deny.into_iter().map(parse).collect::<Result<Vec<_>, _>>()?;

    if let Some(net) = deny.iter().find(|net| net.contains(*ip)) {
        return Err(ScanfigError::validation(
            shown,
            format!("{ip} can not be in network {net}"),
        ));
    }
    if allow.is_empty() || allow.iter().any(|net| net.contains(*ip)) {
        return Ok(());
    }
    let names: Vec<_> = allow.iter().map(ToString::to_string).collect();
    Err(ScanfigError::validation(
        shown,
        format!("{ip} did not match any allowed network ({})", names.join(",")),
    ))
}

/// Run the `version`, `is` and `net` checks against `ip`.
fn check_address(ip: &IpAddr, tags: &Tags, shown: &str) -> Result<(), ScanfigError> {
    check_version(ip, tags, shown)?;
    check_classes(ip, tags, shown)?;
    check_networks(ip, tags, shown)
}

pub struct IpCreator;

impl SetterCreator<IpAddr> for IpCreator {
    fn create(&self, slot: Slot<IpAddr>, tags: &Tags) -> Box<dyn Setter> {
        Box::new(IpSetter {
            slot,
            tags: tags.clone(),
        })
    }
}

struct IpSetter {
    slot: Slot<IpAddr>,
    tags: Tags,
}

impl Setter for IpSetter {
    fn render(&self) -> String {
        self.slot
            .get()
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
            .to_string()
    }

    fn set_str(&self, value: &str) -> Result<(), ScanfigError> {
        let ip = value
            .trim()
            .parse::<IpAddr>()
            .map_err(|_| ScanfigError::conversion(value, IP))?
            .to_canonical();
        check_address(&ip, &self.tags, value)?;
        self.slot.store(ip)
    }

    fn set_int(&self, value: i64) -> Result<(), ScanfigError> {
        Err(ScanfigError::conversion(value, IP))
    }

    fn set_uint(&self, value: u64) -> Result<(), ScanfigError> {
        Err(ScanfigError::conversion(value, IP))
    }

    fn set_float(&self, value: f64) -> Result<(), ScanfigError> {
        Err(ScanfigError::conversion(value, IP))
    }

    fn set_bool(&self, value: bool) -> Result<(), ScanfigError> {
        Err(ScanfigError::conversion(value, IP))
    }

    fn get(&self) -> Box<dyn Any> {
        Box::new(self.slot.get().unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)))
    }
}

pub struct IpNetworkCreator;

impl SetterCreator<IpNetwork> for IpNetworkCreator {
    fn create(&self, slot: Slot<IpNetwork>, tags: &Tags) -> Box<dyn Setter> {
        Box::new(IpNetworkSetter {
            slot,
            tags: tags.clone(),
        })
    }
}

struct IpNetworkSetter {
    slot: Slot<IpNetwork>,
    tags: Tags,
}

impl Setter for IpNetworkSetter {
    fn render(&self) -> String {
        self.slot.get().unwrap_or_default().to_string()
    }

    fn set_str(&self, value: &str) -> Result<(), ScanfigError> {
        let network: IpNetwork = value.parse()?;
        check_address(&network.addr(), &self.tags, &network.to_string())?;
        self.slot.store(network)
    }

    fn set_int(&self, value: i64) -> Result<(), ScanfigError> {
        Err(ScanfigError::conversion(value, NETWORK))
    }

    fn set_uint(&self, value: u64) -> Result<(), ScanfigError> {
        Err(ScanfigError::conversion(value, NETWORK))
    }

    fn set_float(&self, value: f64) -> Result<(), ScanfigError> {
        Err(ScanfigError::conversion(value, NETWORK))
    }

    fn set_bool(&self, value: bool) -> Result<(), ScanfigError> {
        Err(ScanfigError::conversion(value, NETWORK))
    }

    fn get(&self) -> Box<dyn Any> {
        Box::new(self.slot.get().unwrap_or_default())
    }
}
