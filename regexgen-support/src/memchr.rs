/*!
A thin wrapper around the `memchr` crate for the one case generated
Backtracking code needs: scanning ahead to the next occurrence of a
pattern's required prefix byte (`spec.md` §4.2, "Optimizations applied").

Grounded directly on the teacher's own `util::memchr` shim
(`examples/thomcc-regex-automata/src/util/memchr.rs`), which wraps
`memchr::memchr` the same way for the same reason: a real haystack scan at
match time, not something to hand-roll with `Iterator::position`.
*/

/// Finds the next occurrence of `needle` in `haystack`, or `None` if it does
/// not occur.
#[inline]
pub fn memchr(needle: u8, haystack: &[u8]) -> Option<usize> {
    memchr::memchr(needle, haystack)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_the_first_occurrence() {
        assert_eq!(memchr(b'c', b"abcabc"), Some(2));
        assert_eq!(memchr(b'z', b"abcabc"), None);
    }
}
