//! Intrusive free-list links stored inside free slots.
//!
//! While a slot is free, its first [`LINK_WIDTH`] bytes hold the index of
//! the next free slot as a native-endian `usize`, or [`NIL`] at the end of
//! the list. Once the slot is handed out those bytes belong to the caller
//! again. Encoding an index instead of an address keeps the list valid
//! without any `unsafe` reinterpretation of slot memory.

/// Bytes occupied by a link at the start of a free slot.
pub const LINK_WIDTH: usize = std::mem::size_of::<usize>();

/// End-of-list sentinel. Never a valid slot index.
pub const NIL: usize = usize::MAX;

/// Read the link stored at the start of `slot`.
///
/// # Panics
///
/// Panics if `slot` is shorter than [`LINK_WIDTH`].
pub fn read_link(slot: &[u8]) -> usize {
    let mut raw = [0u8; LINK_WIDTH];
    raw.copy_from_slice(&slot[..LINK_WIDTH]);
    usize::from_ne_bytes(raw)
}

/// Store `next` at the start of `slot`.
///
/// # Panics
///
/// Panics if `slot` is shorter than [`LINK_WIDTH`].
pub fn write_link(slot: &mut [u8], next: usize) {
    slot[..LINK_WIDTH].copy_from_slice(&next.to_ne_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_round_trip_leaves_tail_untouched() {
        let mut slot = vec![0xEEu8; LINK_WIDTH + 4];
        write_link(&mut slot, 42);
        assert_eq!(read_link(&slot), 42);
        assert!(slot[LINK_WIDTH..].iter().all(|&b| b == 0xEE));
    }

    #[test]
    fn nil_survives_encoding() {
        let mut slot = [0u8; LINK_WIDTH];
        write_link(&mut slot, NIL);
        assert_eq!(read_link(&slot), NIL);
        assert!(slot.iter().all(|&b| b == 0xFF));
    }
}
