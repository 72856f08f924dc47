/*!
Streaming protocol support (`spec.md` §4.6, component 8).

The actual chunk-sliding/cancellation machinery generated code runs at
match time lives in the `regexgen-support` crate (every generated reader
depends on it rather than reimplementing buffering per pattern, mirroring
how the teacher's generated DFA tables lean on shared runtime helpers
instead of being fully self-contained). This module holds what the
*generator* needs: the pure arithmetic in [`chunk`], and the small
configuration/kind types `codegen::streaming` uses to decide which reader
wrapper to emit and how to size its buffer.
*/

pub mod chunk;

pub use chunk::ChunkConfig;

/// Which of the four reader wrappers `spec.md` §4.6 describes is being
/// emitted for a given call site.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReaderKind {
    Find,
    Replace,
    Select,
    Reject,
}

impl ReaderKind {
    /// The generated constructor name for this reader kind (`spec.md` §6:
    /// `FindReader`, `ReplaceReader`, `SelectReader`, `RejectReader`).
    pub fn constructor_name(self) -> &'static str {
        match self {
            ReaderKind::Find => "FindReader",
            ReaderKind::Replace => "ReplaceReader",
            ReaderKind::Select => "SelectReader",
            ReaderKind::Reject => "RejectReader",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_names_match_the_external_interface_list() {
        assert_eq!(ReaderKind::Find.constructor_name(), "FindReader");
        assert_eq!(ReaderKind::Replace.constructor_name(), "ReplaceReader");
        assert_eq!(ReaderKind::Select.constructor_name(), "SelectReader");
        assert_eq!(ReaderKind::Reject.constructor_name(), "RejectReader");
    }
}
