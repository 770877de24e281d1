//! CASIO FX-502P text <-> program-byte translation.
//!
//! Explicitly out of scope for `kcs_core` (spec.md §1 calls this a
//! "calculator-specific byte-format translation" collaborator), but the
//! `fx502p-load`/`fx502p-save` subcommands need something here to be
//! runnable end to end.
//!
//! The original `casio-fx-tools` package ports a `KCSCasio.py` module that
//! defines the FX-502P's real token table (`text2bytes`/`bytes2text` in
//! `KCSCmdline.py`), but that module wasn't part of the retrieved
//! `original_source/` slice — only `KCSCmdline.py`, `KCSProtocol.py`,
//! `cmdline.py`, and `setup.py` were kept. Rather than invent byte-exact
//! calculator token semantics with no source to ground them in, this is a
//! documented, byte-reversible placeholder: one text character maps to
//! exactly one program byte and back, so the CLI round trip is always
//! lossless for text representable in a single byte (Latin-1).

/// Converts program text into FX-502P program bytes.
///
/// Characters outside the Latin-1 range (`0..=255`) are lossy: only their
/// low byte is kept. This mirrors the single-byte-per-character shape a
/// real calculator's character set would have, without claiming to
/// reproduce the FX-502P's actual token table.
pub fn text_to_bytes(text: &str) -> Vec<u8> {
    text.chars().map(|c| (c as u32 & 0xFF) as u8).collect()
}

/// Converts FX-502P program bytes back into text, the inverse of
/// [`text_to_bytes`] for any byte sequence produced by it.
pub fn bytes_to_text(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_round_trips() {
        let text = "10 PRINT \"HELLO\"\n20 GOTO 10\n";
        let bytes = text_to_bytes(text);
        assert_eq!(bytes_to_text(&bytes), text);
    }

    #[test]
    fn empty_text_round_trips() {
        assert_eq!(text_to_bytes("").len(), 0);
        assert_eq!(bytes_to_text(&[]), "");
    }

    #[test]
    fn latin1_bytes_round_trip() {
        let bytes: Vec<u8> = (0..=255).collect();
        let text = bytes_to_text(&bytes);
        assert_eq!(text_to_bytes(&text), bytes);
    }
}
