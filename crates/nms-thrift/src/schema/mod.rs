// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Payload schemas exchanged with controllers and aggregators
//!
//! Field ids match the deployed IDL. Fields a reader does not know are
//! skipped, so newer remotes can add fields without breaking the proxy.

/// Thrift i32 enum that keeps unrecognised values instead of failing
macro_rules! thrift_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$variant_meta:meta])* $variant:ident = $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(from = "i32", into = "i32")]
        $vis enum $name {
            $($(#[$variant_meta])* $variant,)+
            /// Value not known to this build
            Unknown(i32),
        }

        impl $name {
            pub fn as_i32(self) -> i32 {
                match self {
                    $(Self::$variant => $value,)+
                    Self::Unknown(value) => value,
                }
            }

            /// Variant name, `None` for unknown values
            pub fn name(self) -> Option<&'static str> {
                match self {
                    $(Self::$variant => Some(stringify!($variant)),)+
                    Self::Unknown(_) => None,
                }
            }
        }

        impl From<i32> for $name {
            fn from(value: i32) -> Self {
                match value {
                    $($value => Self::$variant,)+
                    other => Self::Unknown(other),
                }
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> i32 {
                value.as_i32()
            }
        }
    };
}

pub mod aggregator;
pub mod controller;
pub mod network;
pub mod topology;
