//! Packed-field reader for the one-byte flag fields scattered through a GIF.
//!
//! Bits are numbered the way the GIF89a document draws them: bit 0 is the
//! most significant bit of the byte.

/// Extract `len` bits starting at `start_bit` (MSB first) as an integer.
///
/// `extract_bits(0b1010_0111, 5, 3) == 0b111`
pub fn extract_bits(byte: u8, start_bit: u8, len: u8) -> u8 {
    debug_assert!(len >= 1 && start_bit + len <= 8, "bit range out of byte");

    let shift = 8 - start_bit - len;
    let mask = ((1u16 << len) - 1) as u8;
    (byte >> shift) & mask
}

/// Single bit form of [`extract_bits`].
pub fn bit(byte: u8, index: u8) -> bool {
    extract_bits(byte, index, 1) == 1
}

/// Byte length of a color table described by a packed field whose
/// "table present" flag sits at bit 0 and whose size sits at bits 5..8.
///
/// This is the layout shared by the logical screen descriptor and the
/// image descriptor.
pub fn color_table_len(packed: u8) -> usize {
    if !bit(packed, 0) {
        return 0;
    }

    let size = extract_bits(packed, 5, 3);
    3 * (1usize << (size + 1))
}
