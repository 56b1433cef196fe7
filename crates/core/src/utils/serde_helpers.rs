//! Case-insensitive parsing helpers for configuration enums

/// Macro to implement case-insensitive `FromStr` and `Deserialize` for enums
///
/// Configuration values come from hand-edited property files, so `Managed`,
/// `managed` and `MANAGED` all name the same variant.
///
/// Usage:
/// ```
/// #[derive(Debug, PartialEq)]
/// enum Mode {
///     Console,
///     Process,
/// }
///
/// ptf_core::impl_case_insensitive_enum!(
///     Mode,
///     "mode",
///     Console => "console",
///     Process => "process"
/// );
///
/// assert_eq!("CONSOLE".parse::<Mode>().unwrap(), Mode::Console);
/// ```
#[macro_export]
macro_rules! impl_case_insensitive_enum {
    ($enum_type:ty, $what:expr, $($variant:ident => $str_val:literal),+ $(,)?) => {
        impl ::std::str::FromStr for $enum_type {
            type Err = ::std::string::String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $(
                        $str_val => Ok(Self::$variant),
                    )+
                    _ => Err(format!(
                        "unknown {} '{}', expected one of: {}",
                        $what,
                        s,
                        [$($str_val),+].join(", ")
                    )),
                }
            }
        }

        impl<'de> serde::Deserialize<'de> for $enum_type {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = ::std::string::String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }

        impl $enum_type {
            /// Canonical lowercase spelling.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(
                        Self::$variant => $str_val,
                    )+
                }
            }
        }
    };
}
