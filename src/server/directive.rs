//! In-band control directive parsing.
//!
//! The wire protocol carries one textual directive: a received chunk that
//! starts with the legacy `AESDCHAR_IOCSEEKTO:` prefix and parses as two
//! comma-separated unsigned integers is a seek-to-command request. Anything
//! that fails to parse is ordinary data and must be stored, preserving the
//! behavior clients already depend on.

use crate::device::SeekTo;

/// Prefix that marks a seek-to-command directive.
pub const SEEK_DIRECTIVE_PREFIX: &[u8] = b"AESDCHAR_IOCSEEKTO:";

/// Parses a received chunk as a seek directive: the prefix, a command
/// index, a comma, an offset, and at most one trailing terminator. Returns
/// `None` when the chunk is anything else.
pub fn parse_seek_directive(chunk: &[u8]) -> Option<SeekTo> {
    let rest = chunk.strip_prefix(SEEK_DIRECTIVE_PREFIX)?;
    let rest = rest.strip_suffix(b"\n").unwrap_or(rest);
    let text = std::str::from_utf8(rest).ok()?;
    let (index, offset) = text.split_once(',')?;
    Some(SeekTo {
        write_cmd: index.parse().ok()?,
        write_cmd_offset: offset.parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_and_without_terminator() {
        let expected = SeekTo {
            write_cmd: 2,
            write_cmd_offset: 4,
        };
        assert_eq!(parse_seek_directive(b"AESDCHAR_IOCSEEKTO:2,4\n"), Some(expected));
        assert_eq!(parse_seek_directive(b"AESDCHAR_IOCSEEKTO:2,4"), Some(expected));
    }

    #[test]
    fn parses_zero_and_large_values() {
        assert_eq!(
            parse_seek_directive(b"AESDCHAR_IOCSEEKTO:0,0\n"),
            Some(SeekTo {
                write_cmd: 0,
                write_cmd_offset: 0,
            })
        );
        assert_eq!(
            parse_seek_directive(b"AESDCHAR_IOCSEEKTO:4294967295,1\n"),
            Some(SeekTo {
                write_cmd: u32::MAX,
                write_cmd_offset: 1,
            })
        );
    }

    #[test]
    fn malformed_directives_are_data() {
        for chunk in [
            &b"AESDCHAR_IOCSEEKTO:"[..],
            b"AESDCHAR_IOCSEEKTO:2\n",
            b"AESDCHAR_IOCSEEKTO:2,\n",
            b"AESDCHAR_IOCSEEKTO:,4\n",
            b"AESDCHAR_IOCSEEKTO:2,4,6\n",
            b"AESDCHAR_IOCSEEKTO:-1,4\n",
            b"AESDCHAR_IOCSEEKTO:2,four\n",
            b"AESDCHAR_IOCSEEKTO:2,4\nextra",
            b"AESDCHAR_IOCSEEKTO:4294967296,0\n",
            b"aesdchar_iocseekto:2,4\n",
            b"hello\n",
        ] {
            assert_eq!(parse_seek_directive(chunk), None, "chunk {chunk:?}");
        }
    }
}
