//! Little-endian field codec for records stored in arena bytes.
//!
//! Container headers (list nodes, map entries, deque boundary tags) are
//! laid out as packed little-endian `u32` words. These helpers read and
//! write those words with bounds checks that report
//! [`ArenaError::OutOfRange`] instead of panicking.

use strata_core::ArenaError;

/// Width of an encoded `u32` word.
pub const WORD: u32 = 4;

/// Read a little-endian `u32` at byte offset `at`.
pub fn read_u32(bytes: &[u8], at: u32) -> Result<u32, ArenaError> {
    let start = at as usize;
    let word: [u8; 4] = bytes
        .get(start..start.saturating_add(WORD as usize))
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| out_of_range(bytes, at))?;
    Ok(u32::from_le_bytes(word))
}

/// Write `value` as a little-endian `u32` at byte offset `at`.
pub fn write_u32(bytes: &mut [u8], at: u32, value: u32) -> Result<(), ArenaError> {
    let err = out_of_range(bytes, at);
    let start = at as usize;
    let slot = bytes.get_mut(start..start.saturating_add(WORD as usize)).ok_or(err)?;
    slot.copy_from_slice(&value.to_le_bytes());
    Ok(())
}

fn out_of_range(bytes: &[u8], at: u32) -> ArenaError {
    ArenaError::OutOfRange {
        offset: at,
        len: WORD,
        capacity: u32::try_from(bytes.len()).unwrap_or(u32::MAX),
    }
}

/// Convert a slice length to `u32`, saturating at `u32::MAX`.
///
/// A saturated length can never pass a capacity check, so callers get a
/// size error rather than a silently truncated write.
pub fn len_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_round_trip() {
        let mut buf = [0u8; 12];
        write_u32(&mut buf, 4, 0xDEAD_BEEF).unwrap();
        assert_eq!(read_u32(&buf, 4).unwrap(), 0xDEAD_BEEF);
        assert_eq!(&buf[4..8], &[0xEF, 0xBE, 0xAD, 0xDE]);
    }

    #[test]
    fn read_past_end_is_out_of_range() {
        let buf = [0u8; 6];
        assert!(matches!(
            read_u32(&buf, 4),
            Err(ArenaError::OutOfRange { offset: 4, .. })
        ));
    }

    #[test]
    fn write_past_end_leaves_buffer_untouched() {
        let mut buf = [7u8; 6];
        assert!(write_u32(&mut buf, 3, 1).is_err());
        assert_eq!(buf, [7u8; 6]);
    }

    #[test]
    fn len_u32_saturates() {
        assert_eq!(len_u32(12), 12);
        assert_eq!(len_u32(usize::MAX), u32::MAX);
    }
}
