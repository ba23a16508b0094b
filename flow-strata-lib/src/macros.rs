// Generates a zerocopy-friendly protocol number newtype with named constants,
// kebab-case names (Display/FromStr) and numeric serde.
#[macro_export]
macro_rules! protocol_constants {
    (@construct_u8 $ztype:ty, $val:expr) => { $val };

    (@construct_new $ztype:ty, $val:expr) => { <$ztype>::new($val) };

    (@impl $(#[$outer:meta])*, $type_name:ident, $ztype:ty, $primitive:ty, $strategy:ident, $( $const_name:ident = $val:expr; )+ ) => {
        paste::paste! {
            #[doc = concat!("A ", stringify!($type_name), " number stored as `", stringify!($ztype), "`.")]
            ///
            /// Unknown values are representable; `is_known` tells whether the value has a name.
            $(#[$outer])*
            #[derive(
                Clone,
                Copy,
                PartialEq,
                Eq,
                Hash,
                Debug,
                zerocopy::FromBytes,
                zerocopy::IntoBytes,
                zerocopy::Immutable,
                zerocopy::KnownLayout,
                zerocopy::Unaligned,
            )]
            #[repr(transparent)]
            pub struct $type_name(pub $ztype);

            impl $type_name {
                $(
                    pub const $const_name: $type_name = $type_name($crate::protocol_constants!(@$strategy $ztype, $val));
                )+

                /// Returns the raw protocol number.
                #[inline]
                pub fn value(&self) -> $primitive {
                    self.0.into()
                }

                pub fn is_known(&self) -> bool {
                    <[< $type_name Name >]>::try_from(self.value()).is_ok()
                }
            }

            impl Default for $type_name {
                fn default() -> Self {
                    Self(<$ztype>::from(0 as $primitive))
                }
            }

            #[derive(Debug, PartialEq, strum::EnumString, strum::IntoStaticStr, Clone, Copy)]
            #[strum(serialize_all = "kebab-case")]
            #[allow(non_camel_case_types)]
            enum [< $type_name Name >] {
                $(
                    $const_name,
                )+
            }

            impl From<[< $type_name Name >]> for $primitive {
                fn from(v: [< $type_name Name >]) -> Self {
                    match v {
                        $(
                            [< $type_name Name >]::$const_name => $val,
                        )+
                    }
                }
            }

            impl TryFrom<$primitive> for [< $type_name Name >] {
                type Error = ();
                fn try_from(v: $primitive) -> Result<Self, Self::Error> {
                    match v {
                        $(
                            $val => Ok([< $type_name Name >]::$const_name),
                        )+
                        _ => Err(()),
                    }
                }
            }

            impl From<$primitive> for $type_name {
                #[inline]
                fn from(v: $primitive) -> Self {
                    Self(v.into())
                }
            }

            impl From<$type_name> for $primitive {
                #[inline]
                fn from(v: $type_name) -> Self {
                    v.0.into()
                }
            }

            impl std::str::FromStr for $type_name {
                type Err = strum::ParseError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    let name: [< $type_name Name >] = s.parse()?;
                    let p: $primitive = name.into();
                    Ok(Self::from(p))
                }
            }

            impl std::fmt::Display for $type_name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    match <[< $type_name Name >]>::try_from(self.value()) {
                        Ok(name) => {
                            let s: &'static str = name.into();
                            f.write_str(s)
                        }
                        Err(()) => write!(f, "0x{:x}", self.value()),
                    }
                }
            }

            impl serde::Serialize for $type_name {
                fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
                where
                    S: serde::Serializer,
                {
                    serde::Serialize::serialize(&self.value(), serializer)
                }
            }

            impl<'de> serde::Deserialize<'de> for $type_name {
                fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
                where
                    D: serde::Deserializer<'de>,
                {
                    let val = <$primitive as serde::Deserialize>::deserialize(deserializer)?;
                    Ok(Self::from(val))
                }
            }
        }
    };

    (   $(#[$outer:meta])*
        $type_name:ident,
        u8,
        $primitive:ty:
        $( $const_name:ident = $val:expr; )+
    ) => {
        $crate::protocol_constants!(@impl $(#[$outer])*, $type_name, u8, $primitive, construct_u8, $( $const_name = $val; )+ );
    };

    (   $(#[$outer:meta])*
        $type_name:ident,
        $ztype:ty,
        $primitive:ty:
        $( $const_name:ident = $val:expr; )+
    ) => {
        $crate::protocol_constants!(@impl $(#[$outer])*, $type_name, $ztype, $primitive, construct_new, $( $const_name = $val; )+ );
    };
}
