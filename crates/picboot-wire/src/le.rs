//! Little-endian integer packing helpers shared by the wire codec and the
//! layers built on top of it.

/// Appends the little-endian bytes of a 16-bit value.
pub fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Appends the little-endian bytes of a 32-bit value.
pub fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Reads a little-endian `u16` from the start of `data`.
///
/// Returns `None` if `data` is shorter than 2 bytes.
#[must_use]
pub fn read_u16(data: &[u8]) -> Option<u16> {
    let bytes: [u8; 2] = data.get(0..2)?.try_into().ok()?;
    Some(u16::from_le_bytes(bytes))
}

/// Reads a little-endian `u32` from the start of `data`.
///
/// Returns `None` if `data` is shorter than 4 bytes.
#[must_use]
pub fn read_u32(data: &[u8]) -> Option<u32> {
    let bytes: [u8; 4] = data.get(0..4)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_u16() {
        let mut buf = Vec::new();
        push_u16(&mut buf, 0xABCD);
        assert_eq!(read_u16(&buf), Some(0xABCD));
    }

    #[test]
    fn round_trips_u32() {
        let mut buf = Vec::new();
        push_u32(&mut buf, 0x0102_0304);
        assert_eq!(read_u32(&buf), Some(0x0102_0304));
    }

    #[test]
    fn rejects_short_buffers() {
        assert_eq!(read_u16(&[0x01]), None);
        assert_eq!(read_u32(&[0x01, 0x02, 0x03]), None);
    }
}
