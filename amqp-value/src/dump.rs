//! Hex dump of raw bytes for tracing

use std::fmt::Write;

const ROW_WIDTH: usize = 16;

/// Renders `bytes` as rows of 16: an 8 digit hex offset, the bytes in hex and a column
/// of printable characters, ie.
///
/// ```text
/// 00000000: 41 4d 51 50 00 01 00 00                           * AMQP....         *
/// ```
///
/// Empty input still renders one row. Rows are separated by `\n`.
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    let mut offset = 0;
    loop {
        let row = &bytes[offset..bytes.len().min(offset + ROW_WIDTH)];
        write_row(&mut out, offset, row);
        offset += row.len();
        if offset >= bytes.len() {
            break;
        }
        out.push('\n');
    }
    out
}

fn write_row(out: &mut String, offset: usize, row: &[u8]) {
    // Writing into a String cannot fail
    let _ = write!(out, "{:08x}: ", offset);
    for b in row {
        let _ = write!(out, "{:02x} ", b);
    }
    for _ in row.len()..ROW_WIDTH {
        out.push_str("   ");
    }
    out.push_str("  * ");
    for &b in row {
        match b.is_ascii_graphic() || b == b' ' {
            true => out.push(b as char),
            false => out.push('.'),
        }
    }
    for _ in row.len()..ROW_WIDTH {
        out.push(' ');
    }
    out.push_str(" *");
}

#[cfg(test)]
mod tests {
    use super::hex_dump;

    #[test]
    fn empty_input_renders_one_row() {
        let expected = format!("00000000: {}  * {} *", " ".repeat(48), " ".repeat(16));
        assert_eq!(hex_dump(&[]), expected);
    }

    #[test]
    fn protocol_header_row() {
        let dump = hex_dump(b"AMQP\x00\x01\x00\x00");
        assert_eq!(
            dump,
            format!(
                "00000000: 41 4d 51 50 00 01 00 00 {}  * AMQP.... {} *",
                " ".repeat(24),
                " ".repeat(7)
            )
        );
    }

    #[test]
    fn rows_are_split_at_sixteen_bytes() {
        let bytes: Vec<u8> = (0u8..20).collect();
        let dump = hex_dump(&bytes);
        let rows: Vec<_> = dump.split('\n').collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("00000000: 00 01 02"));
        assert!(rows[1].starts_with("00000010: 10 11 12 13 "));
        assert!(rows[0].ends_with("* ................ *"));
    }
}
