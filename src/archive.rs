use std::io::{self, Read, Write};

use crate::{BsaError, Result};
use encoding::label::encoding_from_whatwg_label;
use encoding::{DecoderTrap, EncoderTrap};

/// Serializes string into a NULL-terminated list of win1252 chars and write it
/// into writer.
pub fn serialize_as_win1252_cstr_into<W: Write>(mut writer: W, string: &str) -> Result<()> {
    let mut vec = serialize_to_win1252(string)?;
    vec.push(0); // NUL char terminator
    writer.write_all(vec.as_slice())?;
    Ok(())
}

pub fn serialize_to_win1252(string: &str) -> Result<Vec<u8>> {
    let encoder = encoding_from_whatwg_label("windows-1252")
        .ok_or_else(|| BsaError::serialization_error("Encoder unavailable"))?;
    encoder
        .encode(string, EncoderTrap::Strict)
        .map_err(|_| BsaError::serialization_error(format!("Cannot encode \"{}\"", string)))
}

pub fn string_from_win1252(v: &[u8]) -> Result<String> {
    let decoder = encoding_from_whatwg_label("windows-1252")
        .ok_or_else(|| BsaError::malformed_record("Decoder unavailable"))?;
    decoder
        .decode(v, DecoderTrap::Strict)
        .map_err(BsaError::malformed_record)
}

/// Reads bytes up to (and excluding) the next NUL char.
///
/// The terminator is consumed. Running out of input before it is found
/// means the name table is truncated.
pub fn read_cstr_bytes<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut byte = [0_u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => {
                return Err(BsaError::malformed_record(format!(
                    "Unterminated name after {} bytes",
                    bytes.len()
                )))
            }
            Ok(_) if byte[0] == 0 => return Ok(bytes),
            Ok(_) => bytes.push(byte[0]),
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}
