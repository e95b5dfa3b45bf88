//! Serde impls for the restricted-width integers.
//!
//! The newtypes serialize as their raw integer; deserialization validates
//! the bit width so out-of-range wire data is rejected instead of
//! truncated.

use crate::num::{U14, U16, U25, U32, U4, U7};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

macro_rules! serde_midi_uint {
    ($name:ident, $inner:ty) => {
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                self.get().serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <$inner>::deserialize(deserializer)?;
                $name::try_new(raw).ok_or_else(|| {
                    serde::de::Error::custom(format_args!(
                        "{} out of range for {}",
                        raw,
                        stringify!($name)
                    ))
                })
            }
        }
    };
}

serde_midi_uint!(U4, u8);
serde_midi_uint!(U7, u8);
serde_midi_uint!(U14, u16);
serde_midi_uint!(U16, u16);
serde_midi_uint!(U25, u32);
serde_midi_uint!(U32, u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_as_plain_integer() {
        let json = serde_json::to_string(&U7::new(64)).unwrap();
        assert_eq!(json, "64");
        assert_eq!(serde_json::from_str::<U7>("64").unwrap(), U7::new(64));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(serde_json::from_str::<U7>("128").is_err());
        assert!(serde_json::from_str::<U4>("16").is_err());
    }
}
