//! Builtin leaf converters.
//!
//! Each leaf type gets a [`Configurable`] impl (its zero value) and a creator
//! in the default registry.

mod boolean;
mod float;
mod integer;
mod net;
mod string;
mod time;
mod url;

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::setter::{Configurable, Registry};

pub use boolean::BoolCreator;
pub use float::FloatCreator;
pub use integer::IntegerCreator;
pub use net::{IpCreator, IpNetwork, IpNetworkCreator};
pub use string::StringCreator;
pub use time::{DurationCreator, TimestampCreator, format_duration, parse_duration, parse_timestamp};
pub use self::url::UrlCreator;

macro_rules! defaulted {
    ($($ty:ty),+ $(,)?) => {$(
        impl Configurable for $ty {
            fn zero() -> Self {
                <$ty>::default()
            }
        }
    )+};
}

defaulted!(
    bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, String, Duration,
    DateTime<Utc>, IpNetwork,
);

impl Configurable for IpAddr {
    fn zero() -> Self {
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    }
}

impl Configurable for ::url::Url {
    fn zero() -> Self {
        self::url::blank()
    }
}

pub(crate) fn register_defaults(registry: &mut Registry) {
    registry.add::<bool>(BoolCreator);

    registry.add::<i8>(IntegerCreator::new());
    registry.add::<i16>(IntegerCreator::new());
    registry.add::<i32>(IntegerCreator::new());
    registry.add::<i64>(IntegerCreator::new());
    registry.add::<isize>(IntegerCreator::new());
    registry.add::<u8>(IntegerCreator::new());
    registry.add::<u16>(IntegerCreator::new());
    registry.add::<u32>(IntegerCreator::new());
    registry.add::<u64>(IntegerCreator::new());
    registry.add::<usize>(IntegerCreator::new());

    registry.add::<f32>(FloatCreator::new());
    registry.add::<f64>(FloatCreator::new());

    registry.add::<String>(StringCreator);
    registry.add::<Duration>(DurationCreator);
    registry.add::<DateTime<Utc>>(TimestampCreator);
    registry.add::<IpAddr>(IpCreator);
    registry.add::<IpNetwork>(IpNetworkCreator);
    registry.add::<::url::Url>(UrlCreator);
}
