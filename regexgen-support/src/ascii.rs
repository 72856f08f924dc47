/*!
ASCII character-class test helpers referenced by generated code
(`spec.md` §4.2, word-boundary `EmptyWidth` checks).

Kept as free functions with a short, stable name so every generated match
function can call `regexgen_support::ascii::is_word_byte` instead of
repeating the same bit-twiddling inline per pattern.
*/

/// Whether `b` is a "word" byte for the purposes of `\b`/`\B`: `[0-9A-Za-z_]`
/// (`spec.md`'s ASCII word-boundary semantics; Non-goals explicitly exclude
/// Unicode word boundaries).
#[inline]
pub fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_bytes_are_alnum_or_underscore() {
        assert!(is_word_byte(b'a'));
        assert!(is_word_byte(b'Z'));
        assert!(is_word_byte(b'5'));
        assert!(is_word_byte(b'_'));
        assert!(!is_word_byte(b' '));
        assert!(!is_word_byte(b'-'));
    }
}
