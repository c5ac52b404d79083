// SizeUnit
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use humansize::{
    format_size,
    FormatSizeOptions,
    BINARY,
    DECIMAL,
};
use std::str::FromStr;

/// `SizeUnit` represents how we want bucket sizes to be displayed.
#[derive(Clone, Copy, Debug)]
pub enum SizeUnit {
    /// Represent bucket sizes as human readable using multiples of 1024.
    Binary(FormatSizeOptions),

    /// Represent bucket sizes as the number of bytes.
    Bytes,

    /// Represent bucket sizes as human readable using multiples of 1000.
    Decimal(FormatSizeOptions),
}

impl SizeUnit {
    /// Render `bytes` in this unit.
    pub fn format(&self, bytes: u64) -> String {
        match self {
            Self::Binary(opts)  => format_size(bytes, *opts),
            Self::Bytes         => bytes.to_string(),
            Self::Decimal(opts) => format_size(bytes, *opts),
        }
    }
}

/// This converts from the string arguments we receive on the command line to
/// our enum type.
impl FromStr for SizeUnit {
    type Err = &'static str;

    // We remove the space from the humansize output so that our own output
    // is sortable by `sort -h`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binary"  => {
                let opts = FormatSizeOptions::from(BINARY)
                    .space_after_value(false);

                Ok(Self::Binary(opts))
            },
            "bytes"   => Ok(Self::Bytes),
            "decimal" => {
                let opts = FormatSizeOptions::from(DECIMAL)
                    .space_after_value(false);

                Ok(Self::Decimal(opts))
            },
            _         => Err("no match"),
        }
    }
}
