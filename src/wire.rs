//! Wire envelope
//!
//! ```text
//! +-------+-----------------------+--------------------+
//! | 0x00  | schema id (u32, BE)   | payload ...        |
//! +-------+-----------------------+--------------------+
//!   1 B            4 B               remainder of buffer
//! ```
//!
//! The payload's own format decides its framing; there is no length prefix.

use std::io::Write;

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use crate::error::{Result, SerdeError};

/// Leading byte of every envelope
pub const MAGIC_BYTE: u8 = 0x00;

/// Magic byte plus schema ID
pub const HEADER_LEN: usize = 5;

/// A parsed envelope borrowing its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireEnvelope<'a> {
    pub schema_id: u32,
    pub payload: &'a [u8],
}

/// Frame `payload` with the magic byte and `schema_id`
pub fn write_bytes(schema_id: u32, payload: &[u8]) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.write_u8(MAGIC_BYTE)?;
    buf.write_u32::<BigEndian>(schema_id)?;
    buf.write_all(payload)?;
    Ok(buf)
}

/// Split an envelope into schema ID and payload.
///
/// The magic byte is checked before the length so that short foreign
/// messages report as unrecognized rather than truncated.
pub fn parse(bytes: &[u8]) -> Result<WireEnvelope<'_>> {
    let first = *bytes.first().ok_or(SerdeError::Truncated { len: 0 })?;
    if first != MAGIC_BYTE {
        return Err(SerdeError::UnknownMagicByte(first));
    }
    let id_bytes = bytes
        .get(1..HEADER_LEN)
        .ok_or(SerdeError::Truncated { len: bytes.len() })?;
    Ok(WireEnvelope {
        schema_id: BigEndian::read_u32(id_bytes),
        payload: &bytes[HEADER_LEN..],
    })
}

/// Schema ID of an envelope without touching the payload
pub fn schema_id(bytes: &[u8]) -> Result<u32> {
    parse(bytes).map(|envelope| envelope.schema_id)
}
