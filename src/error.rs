//
// Copyright 2020 bplist00 Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use std;
use std::fmt::{self, Display};

use serde::{de, ser};

pub type Result<T> = std::result::Result<T, Error>;

/// Binary property list parse and generate error.
///
/// A single flat enum covers both directions: decoding an untrusted byte
/// buffer and encoding a value tree (or, through the serde bridge, an
/// arbitrary `Serialize` type) back into one.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A custom error raised by a derived `Serialize`/`Deserialize` impl
    /// reached through the serde bridge.
    Message(String),
    /// The first 8 bytes of the input are not `bplist00`.
    InvalidHeader,
    /// The input is shorter than the minimum possible document, or a
    /// length prefix claims more bytes than remain in the input.
    Truncated,
    /// `offset_size`/`ref_size` are not one of 1, 2, 4, 8, or the offset
    /// table does not fit between the object region and the trailer.
    MalformedTrailer,
    /// An object offset or a container reference falls outside its valid range.
    OutOfBounds,
    /// A marker byte's high nibble is unassigned, or an assigned high
    /// nibble carries an invalid low-nibble subtype.
    UnknownTag,
    /// The parser's recursion depth cap (`document::MAX_RECURSION_DEPTH`) was reached.
    DepthExceeded,
    /// The generator (via the serde bridge) was given a value of a type
    /// that has no corresponding bplist representation.
    Unsupported(&'static str),
    /// More objects were generated than any `ref_size` could index.
    TooManyObjects,
    /// The generated object region exceeds `2^32 - 1` bytes.
    TooLarge,
}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Message(msg) => formatter.write_str(msg),
            Error::InvalidHeader => formatter.write_str("missing or invalid bplist00 header"),
            Error::Truncated => formatter.write_str("unexpected end of input"),
            Error::MalformedTrailer => formatter.write_str("missing or invalid bplist trailer"),
            Error::OutOfBounds => formatter.write_str("object offset or reference out of bounds"),
            Error::UnknownTag => formatter.write_str("unknown or unsupported marker byte"),
            Error::DepthExceeded => formatter.write_str("maximum container nesting depth exceeded"),
            Error::Unsupported(type_name) =>
                write!(formatter, "cannot represent value of type `{}` in a bplist", type_name),
            Error::TooManyObjects => formatter.write_str("too many objects to encode a reference width"),
            Error::TooLarge => formatter.write_str("generated object region exceeds 2^32 - 1 bytes"),
        }
    }
}

impl std::error::Error for Error {}
