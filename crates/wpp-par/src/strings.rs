//! String literal post-processors.
//!
//! Escape decoding happens in the lexer; what arrives here is already a flat
//! byte sequence. Each string kind then applies one of these transforms:
//! normal and raw strings pass through untouched, paragraph strings collapse
//! whitespace, code strings dedent, and hex/bin bodies turn digit runs into
//! bytes.

/// Paragraph transform: every run of whitespace becomes a single space, then
/// one leading and one trailing whitespace byte is stripped.
///
/// Applying it twice changes nothing: after the first pass there are no
/// whitespace runs left to collapse and no leading or trailing space left to
/// strip.
pub fn paragraph(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut in_whitespace = false;

    for &b in input {
        if b.is_ascii_whitespace() {
            if !in_whitespace {
                out.push(b' ');
                in_whitespace = true;
            }
        } else {
            out.push(b);
            in_whitespace = false;
        }
    }

    if out.first() == Some(&b' ') {
        out.remove(0);
    }
    if out.last() == Some(&b' ') {
        out.pop();
    }
    out
}

/// Code transform: trim trailing whitespace, drop a single leading newline,
/// then strip the common indentation shared by every non-blank line.
pub fn code(input: &[u8]) -> Vec<u8> {
    let mut end = input.len();
    while end > 0 && input[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    let mut bytes = &input[..end];

    if bytes.first() == Some(&b'\n') {
        bytes = &bytes[1..];
    }

    let indent = bytes
        .split(|&b| b == b'\n')
        .filter(|line| line.iter().any(|b| !b.is_ascii_whitespace()))
        .map(|line| line.iter().take_while(|b| b.is_ascii_whitespace()).count())
        .min()
        .unwrap_or(0);

    let mut out = Vec::with_capacity(bytes.len());
    for (i, line) in bytes.split(|&b| b == b'\n').enumerate() {
        if i > 0 {
            out.push(b'\n');
        }
        let skip = line
            .iter()
            .take(indent)
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        out.extend_from_slice(&line[skip..]);
    }
    out
}

/// Decode a hex digit body: digits are consumed right-to-left, `_` is
/// ignored, every two digits make one byte, and the accumulated buffer is
/// reversed into natural order at the end. An odd leading digit pads the
/// most significant byte: `ABC` decodes to `0x0A 0xBC`.
pub fn decode_hex(digits: &[u8]) -> Vec<u8> {
    decode_basis(digits, 4, |b| (b as char).to_digit(16))
}

/// Decode a binary digit body: same right-to-left scheme with eight digits
/// per byte.
pub fn decode_bin(digits: &[u8]) -> Vec<u8> {
    decode_basis(digits, 1, |b| (b as char).to_digit(2))
}

fn decode_basis(
    digits: &[u8],
    bits_per_digit: u32,
    to_digit: impl Fn(u8) -> Option<u32>,
) -> Vec<u8> {
    let per_byte = 8 / bits_per_digit;
    let mut out = Vec::new();
    let mut value: u32 = 0;
    let mut count: u32 = 0;

    for &b in digits.iter().rev() {
        if b == b'_' {
            continue;
        }
        // Callers validate digits before decoding; skip anything else.
        let digit = match to_digit(b) {
            Some(d) => d,
            None => continue,
        };
        value |= digit << (bits_per_digit * count);
        count += 1;
        if count == per_byte {
            out.push(value as u8);
            value = 0;
            count = 0;
        }
    }
    if count > 0 {
        out.push(value as u8);
    }

    out.reverse();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== PARAGRAPH ====================

    #[test]
    fn test_paragraph_collapses_runs() {
        assert_eq!(paragraph(b"a  b\t\nc"), b"a b c");
    }

    #[test]
    fn test_paragraph_strips_one_leading_and_trailing() {
        assert_eq!(paragraph(b"  padded  "), b"padded");
        assert_eq!(paragraph(b" x "), b"x");
    }

    #[test]
    fn test_paragraph_empty_and_whitespace_only() {
        assert_eq!(paragraph(b""), b"");
        assert_eq!(paragraph(b"   \n\t "), b"");
    }

    #[test]
    fn test_paragraph_idempotent() {
        let cases: &[&[u8]] = &[b"a  b", b"  lots \n of\t\tspace  ", b"", b"plain"];
        for &case in cases {
            let once = paragraph(case);
            assert_eq!(paragraph(&once), once);
        }
    }

    // ==================== CODE ====================

    #[test]
    fn test_code_strips_common_indent() {
        assert_eq!(
            code(b"   int x = 1;\n   int y = 2;\n"),
            b"int x = 1;\nint y = 2;"
        );
    }

    #[test]
    fn test_code_drops_one_leading_newline() {
        assert_eq!(code(b"\n    foo\n    bar\n"), b"foo\nbar");
    }

    #[test]
    fn test_code_uneven_indent_keeps_excess() {
        assert_eq!(code(b"  a\n    b"), b"a\n  b");
    }

    #[test]
    fn test_code_blank_lines_do_not_set_indent() {
        assert_eq!(code(b"\n  a\n\n  b\n"), b"a\n\nb");
    }

    #[test]
    fn test_code_trims_trailing_whitespace() {
        assert_eq!(code(b"x  \t\n\n"), b"x");
    }

    #[test]
    fn test_code_idempotent_on_dedented() {
        let cases: &[&[u8]] = &[b"a\nb", b"fn f() {\n    body\n}", b"", b"  deeper\nshallow"];
        for &case in cases {
            let once = code(case);
            assert_eq!(code(&once), once);
        }
    }

    // ==================== HEX / BIN ====================

    #[test]
    fn test_hex_basic() {
        assert_eq!(decode_hex(b"4869"), b"\x48\x69");
        assert_eq!(decode_hex(b"48_69"), b"\x48\x69");
        assert_eq!(decode_hex(b"ff"), vec![0xFF]);
        assert_eq!(decode_hex(b"FF"), vec![0xFF]);
    }

    #[test]
    fn test_hex_odd_digit_pads_most_significant() {
        assert_eq!(decode_hex(b"ABC"), vec![0x0A, 0xBC]);
        assert_eq!(decode_hex(b"1"), vec![0x01]);
    }

    #[test]
    fn test_hex_empty() {
        assert!(decode_hex(b"").is_empty());
        assert!(decode_hex(b"___").is_empty());
    }

    #[test]
    fn test_bin_basic() {
        assert_eq!(decode_bin(b"01000001"), vec![0x41]);
        assert_eq!(decode_bin(b"0100_0001"), vec![0x41]);
        assert_eq!(decode_bin(b"0100100001101001"), b"\x48\x69");
    }

    #[test]
    fn test_bin_partial_group() {
        assert_eq!(decode_bin(b"101"), vec![0b101]);
        assert_eq!(decode_bin(b"1_01000001"), vec![0x01, 0x41]);
    }
}
