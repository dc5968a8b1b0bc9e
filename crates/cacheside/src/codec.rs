// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The serialization boundary between typed values and cached bytes.

use std::{error::Error as StdError, fmt};

use serde::{
    Serialize, Serializer,
    de::DeserializeOwned,
    ser::{self, Impossible},
};

/// Converts typed values to and from the bytes stored in a cache.
///
/// A codec must round-trip every type an accessor is used with: decoding the bytes
/// produced by `encode` yields an equal value.
pub trait Codec: Send + Sync {
    /// Encodes `value` into bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented in this codec's format.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    /// Decodes bytes into a `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are malformed or describe a different type.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

/// The default codec: UTF-8 JSON via `serde_json`.
///
/// # Examples
///
/// ```
/// use cacheside::{Codec, JsonCodec};
///
/// let bytes = JsonCodec.encode(&vec![1, 2, 3])?;
/// assert_eq!(bytes, b"[1,2,3]");
///
/// let back: Vec<i32> = JsonCodec.decode(&bytes)?;
/// assert_eq!(back, vec![1, 2, 3]);
/// # Ok::<(), cacheside::CodecError>(())
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(CodecError::new)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(CodecError::new)
    }
}

/// A failure to encode or decode a value.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct CodecError {
    source: Box<dyn StdError + Send + Sync>,
}

impl CodecError {
    /// Creates a codec error from any error or message.
    pub fn new(cause: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self { source: cause.into() }
    }
}

/// Returns `true` if `value` carries nothing to cache.
///
/// That is `None`, `()` or a unit struct, also when wrapped in `Some` or in newtype structs.
/// Such values are what a producer returns when the upstream has no value for a key.
pub(crate) fn is_absent<T: Serialize + ?Sized>(value: &T) -> bool {
    value.serialize(AbsenceCheck).is_ok()
}

/// Serializer that succeeds only for absent values and stops at the first sign of content.
struct AbsenceCheck;

#[derive(Debug)]
struct Present;

impl fmt::Display for Present {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("value is present")
    }
}

impl StdError for Present {}

impl ser::Error for Present {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        Self
    }
}

macro_rules! present {
    ($($method:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method(self, _v: $ty) -> Result<(), Present> {
                Err(Present)
            }
        )*
    };
}

impl Serializer for AbsenceCheck {
    type Ok = ();
    type Error = Present;
    type SerializeSeq = Impossible<(), Present>;
    type SerializeTuple = Impossible<(), Present>;
    type SerializeTupleStruct = Impossible<(), Present>;
    type SerializeTupleVariant = Impossible<(), Present>;
    type SerializeMap = Impossible<(), Present>;
    type SerializeStruct = Impossible<(), Present>;
    type SerializeStructVariant = Impossible<(), Present>;

    present! {
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_i128(i128),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_u128(u128),
        serialize_f32(f32),
        serialize_f64(f64),
        serialize_char(char),
        serialize_str(&str),
        serialize_bytes(&[u8]),
    }

    fn serialize_none(self) -> Result<(), Present> {
        Ok(())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), Present> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), Present> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<(), Present> {
        Ok(())
    }

    fn serialize_unit_variant(self, _name: &'static str, _index: u32, _variant: &'static str) -> Result<(), Present> {
        Err(Present)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(self, _name: &'static str, value: &T) -> Result<(), Present> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<(), Present> {
        Err(Present)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, Present> {
        Err(Present)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, Present> {
        Err(Present)
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeTupleStruct, Present> {
        Err(Present)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, Present> {
        Err(Present)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, Present> {
        Err(Present)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct, Present> {
        Err(Present)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, Present> {
        Err(Present)
    }

    fn collect_str<T: fmt::Display + ?Sized>(self, _value: &T) -> Result<(), Present> {
        Err(Present)
    }
}
