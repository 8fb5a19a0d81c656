//! Status enum string conversions
//!
//! Every lifecycle enum in the workflow is persisted as lowercase text and
//! travels through JSON the same way. `impl_domain_status_conversions!`
//! generates the three conversions once per enum.
//!
//! # Example
//!
//! ```rust
//! use grnflow_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum LinkStatus {
//!     Selected,
//!     Posted,
//!     Failed,
//! }
//!
//! impl_domain_status_conversions!(LinkStatus {
//!     Selected => "selected",
//!     Posted => "posted",
//!     Failed => "failed",
//! });
//!
//! assert_eq!(LinkStatus::Posted.as_str(), "posted");
//! assert_eq!("FAILED".parse::<LinkStatus>().unwrap(), LinkStatus::Failed);
//! ```

/// Implements `as_str`, `Display` and `FromStr` for a fieldless status enum.
///
/// Parsing is case-insensitive; output is always the declared lowercase
/// string. Unknown input yields `Err(String)` naming the enum.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Stable string form used in storage and JSON.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
