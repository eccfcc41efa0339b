//! Escape-sequence stripping for command output shown in the execution view.

const ESC: u8 = 0x1b;
const BEL: u8 = 0x07;
const DEL: u8 = 0x7f;
const CAN: u8 = 0x18;
const SUB: u8 = 0x1a;
const MAX_STRING_SEQUENCE_BYTES: usize = 4096;
const MAX_CSI_SEQUENCE_BYTES: usize = 64;
const TAB_WIDTH: usize = 4;

/// End of a CSI sequence whose parameters start at `start`.
fn parse_csi(bytes: &[u8], start: usize) -> Option<usize> {
    // parameter bytes 0x30..=0x3F, intermediate 0x20..=0x2F, final 0x40..=0x7E
    let mut in_parameters = true;
    for (consumed, index) in (start..bytes.len()).enumerate() {
        let byte = bytes[index];
        // Never consume the lead byte of a multibyte char.
        if byte == ESC || !byte.is_ascii() {
            return Some(index);
        }
        if byte == CAN || byte == SUB || consumed >= MAX_CSI_SEQUENCE_BYTES {
            return Some(index + 1);
        }
        match byte {
            0x30..=0x3f if in_parameters => {}
            0x20..=0x2f => in_parameters = false,
            0x40..=0x7e => return Some(index + 1),
            _ => return Some(index),
        }
    }
    None
}

/// End of an OSC/DCS-style string, terminated by BEL (OSC only) or `ESC \`.
fn parse_string(bytes: &[u8], start: usize, bel_terminates: bool) -> Option<usize> {
    for (consumed, index) in (start..bytes.len()).enumerate() {
        match bytes[index] {
            ESC if bytes.get(index + 1) == Some(&b'\\') => return Some(index + 2),
            ESC => return Some(index),
            BEL if bel_terminates => return Some(index + 1),
            CAN | SUB => return Some(index + 1),
            byte if consumed >= MAX_STRING_SEQUENCE_BYTES && byte.is_ascii() => {
                return Some(index + 1);
            }
            _ => {}
        }
    }
    None
}

/// Length of the escape sequence at the start of `bytes`, which must begin
/// with ESC. `None` when the sequence is not terminated yet.
fn sequence_len(bytes: &[u8]) -> Option<usize> {
    match bytes.get(1)? {
        b'[' => parse_csi(bytes, 2),
        b']' => parse_string(bytes, 2, true),
        b'P' | b'^' | b'_' | b'X' => parse_string(bytes, 2, false),
        next if *next < 128 => Some(2),
        _ => Some(1),
    }
}

/// Remove escape sequences and control bytes other than `\n`, `\r` and `\t`.
/// An unterminated sequence at the end is dropped.
pub fn strip_ansi(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut output = String::with_capacity(text.len());
    let mut plain_start = 0;
    let mut index = 0;

    while index < bytes.len() {
        let byte = bytes[index];
        let skip = if byte == ESC {
            Some(sequence_len(&bytes[index..]).unwrap_or(bytes.len() - index))
        } else if (byte < 0x20 && !matches!(byte, b'\n' | b'\r' | b'\t')) || byte == DEL {
            Some(1)
        } else {
            None
        };

        match skip {
            Some(len) => {
                // Sequences are ASCII, so both ends sit on char boundaries.
                output.push_str(&text[plain_start..index]);
                index += len;
                plain_start = index;
            }
            None => index += 1,
        }
    }
    output.push_str(&text[plain_start.min(text.len())..]);
    output
}

/// One output line as a terminal would leave it: escapes removed, tabs
/// expanded, and text before a carriage return overwritten by what follows.
pub fn display_line(line: &str) -> String {
    let plain = strip_ansi(line);
    let visible = plain
        .trim_end_matches('\r')
        .rsplit('\r')
        .next()
        .unwrap_or_default();

    let mut expanded = String::with_capacity(visible.len());
    let mut column = 0;
    for ch in visible.chars() {
        if ch == '\t' {
            let pad = TAB_WIDTH - column % TAB_WIDTH;
            expanded.extend(std::iter::repeat_n(' ', pad));
            column += pad;
        } else {
            expanded.push(ch);
            column += 1;
        }
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_color_codes() {
        assert_eq!(strip_ansi("a\x1b[31mred\x1b[0mz"), "aredz");
        assert_eq!(strip_ansi("\x1b[1;32mok\x1b[m"), "ok");
    }

    #[test]
    fn strips_titles_and_lone_controls() {
        assert_eq!(strip_ansi("\x1b]0;title\x07x"), "x");
        assert_eq!(strip_ansi("\x1b]8;;http://x\x1b\\link"), "link");
        assert_eq!(strip_ansi(&format!("a{}b\x08c", char::from(DEL))), "abc");
    }

    #[test]
    fn keeps_multibyte_text_intact() {
        assert_eq!(strip_ansi("\x1b[1m世界\x1b[0m → ok"), "世界 → ok");
    }

    #[test]
    fn unterminated_sequence_is_dropped() {
        assert_eq!(strip_ansi("done\x1b[3"), "done");
    }

    #[test]
    fn overlong_csi_stops_before_multibyte_text() {
        let line = format!("a\x1b[{}é tail", "0".repeat(MAX_CSI_SEQUENCE_BYTES));
        assert_eq!(strip_ansi(&line), "aé tail");
        assert_eq!(display_line(&line), "aé tail");
        assert_eq!(strip_ansi("\x1b[1;世界"), "世界");
    }

    #[test]
    fn display_line_applies_carriage_returns_and_tabs() {
        assert_eq!(display_line("10%\r50%\r100%"), "100%");
        assert_eq!(display_line("line\r"), "line");
        assert_eq!(display_line("a\tb"), "a   b");
        assert_eq!(display_line("\x1b[32mab\tc\x1b[0m"), "ab  c");
    }
}
