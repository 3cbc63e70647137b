//! Hex-dump formatting for payload tracing.

const fn nibble_tables() -> ([u8; 256], [u8; 256]) {
    let digits = *b"0123456789ABCDEF";
    let mut high = [0u8; 256];
    let mut low = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        high[i] = digits[i >> 4];
        low[i] = digits[i & 0x0F];
        i += 1;
    }
    (high, low)
}

const HIGH_DIGITS: [u8; 256] = nibble_tables().0;
const LOW_DIGITS: [u8; 256] = nibble_tables().1;

/// Formats `bytes` as uppercase hex pairs separated by single spaces.
///
/// Returns `"empty"` when there is nothing to dump, so log lines never carry
/// a bare empty string.
pub fn dump(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return "empty".to_string();
    }

    let mut out = String::with_capacity(bytes.len() * 3 - 1);
    for (i, byte) in bytes.iter().enumerate() {
        if i != 0 {
            out.push(' ');
        }
        out.push(HIGH_DIGITS[*byte as usize] as char);
        out.push(LOW_DIGITS[*byte as usize] as char);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(dump(&[]), "empty");
    }

    #[test]
    fn test_single_byte() {
        assert_eq!(dump(&[0x00]), "00");
        assert_eq!(dump(&[0xFF]), "FF");
    }

    #[test]
    fn test_multiple_bytes() {
        assert_eq!(dump(&[0xDE, 0xAD, 0xBE, 0xEF]), "DE AD BE EF");
        assert_eq!(dump(b"hi"), "68 69");
    }
}
