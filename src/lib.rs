//
// Copyright 2020 bplist00 Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! A native Rust reader and writer for Apple binary property list
//! (`bplist00`) documents.
//!
//! ```
//! use bplist00::Value;
//!
//! let mut dictionary = bplist00::value::Dictionary::new();
//! dictionary.insert(Value::from("name"), Value::from("bplist00"));
//!
//! let document = bplist00::generate(&Value::from(dictionary)).unwrap();
//! let parsed = bplist00::parse(&document).unwrap();
//! assert_eq!(parsed, bplist00::parse(&document).unwrap());
//! ```

mod bridge;
mod de;
mod document;
mod error;
mod ser;

pub mod value;

pub use error::{Error, Result};
pub use value::{Array, Date, Dictionary, Uid, Value};

pub use de::parse;
pub use ser::generate;

/// Deserializes a value of type `T` from a complete `bplist00` document.
pub fn from_slice<T>(input: &[u8]) -> Result<T>
where
    T: for<'de> serde::Deserialize<'de>,
{
    let value = parse(input)?;
    bridge::from_value(value)
}

/// Serializes a value of type `T` into a complete `bplist00` document.
pub fn to_vec<T>(value: &T) -> Result<Vec<u8>>
where
    T: serde::Serialize,
{
    let value = bridge::to_value(value)?;
    generate(&value)
}
