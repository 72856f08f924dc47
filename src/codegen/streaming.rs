/*!
Streaming reader code generation (`spec.md` §4.6/§6: `FindReader`,
`ReplaceReader`, `SelectReader`, `RejectReader`).

Each reader is a thin generated wrapper around
`regexgen_support::ChunkBuffer` (`spec.md` §4.7): the buffer-sliding and
cancellation-checking machinery is not pattern-specific and lives in that
shared crate; only the "search this chunk with this pattern's `find`
function" call is generated per pattern, matching the teacher's own split
between hand-written `hybrid`/`dfa` search loops and the generated DFA
tables they walk.
*/

use proc_macro2::TokenStream;
use quote::quote;

use crate::codegen::ident;
use crate::inst::Prog;
use crate::streaming::ChunkConfig;

/// Emits `struct {name}FindReader<R>` plus its `new`/`next_match`.
///
/// `find_fn` must be the name of a generated raw `fn(&[u8]) ->
/// Option<{Vec<Option<usize>>|[Option<usize>; n]}>` function, i.e. the
/// private `{name}_slots` sibling of a `Find` matcher, not its public
/// `{Name}Match`-returning wrapper (`spec.md` §4.5): only slots 0/1 (the
/// whole match) are read here; `ReplaceReader`/etc. reuse the same scan
/// loop with a different per-match action, see [`emit_replace_reader`].
pub fn emit_find_reader(name: &str, find_fn: &str, config: ChunkConfig) -> TokenStream {
    let struct_ident = ident(&format!("{name}FindReader"));
    let find_ident = ident(find_fn);
    let buffer_size = config.buffer_size;
    let max_leftover = config.max_leftover;

    quote! {
        pub struct #struct_ident<R> {
            buf: regexgen_support::ChunkBuffer<R>,
            searched: usize,
        }

        impl<R: std::io::Read> #struct_ident<R> {
            pub fn new(reader: R, cancel: regexgen_support::CancellationToken) -> Self {
                #struct_ident {
                    buf: regexgen_support::ChunkBuffer::new(reader, #buffer_size, #max_leftover, cancel),
                    searched: 0,
                }
            }

            /// Returns the next match's absolute `[start, end)` stream
            /// offsets, or `None` at end of stream (`spec.md` §4.6).
            pub fn next_match(&mut self) -> std::io::Result<Option<(usize, usize)>> {
                loop {
                    self.buf.fill()?;
                    let reportable = self.buf.reportable_end();
                    let data = self.buf.data();
                    if self.searched < data.len() {
                        if let Some(slots) = #find_ident(&data[self.searched..]) {
                            let start = self.searched + slots[0].expect("whole match always starts");
                            let end = self.searched + slots[1].expect("whole match always ends");
                            if end <= reportable {
                                self.buf.commit(end);
                                let offset = self.buf.stream_offset();
                                self.searched = end;
                                return Ok(Some((offset + start, offset + end)));
                            }
                        }
                    }
                    if self.buf.is_eof() {
                        return Ok(None);
                    }
                    let before = self.buf.data().len();
                    if !self.buf.slide() {
                        return Err(std::io::Error::new(
                            std::io::ErrorKind::Other,
                            "regexgen: max_leftover leaves no room to grow within buffer_size",
                        ));
                    }
                    let dropped = before - self.buf.data().len();
                    self.searched = self.searched.saturating_sub(dropped);
                }
            }
        }
    }
}

/// Emits `struct {name}ReplaceReader<R>`, identical scan loop to
/// [`emit_find_reader`] but materializing the replacement template into an
/// accumulating output buffer instead of reporting raw offsets (`spec.md`
/// §6: `ReplaceReader`).
///
/// `find_fn` must be a raw `{name}_slots`-style function, the same
/// requirement [`emit_find_reader`] has: the reader needs every group's
/// span, not just the whole match, to resolve `$1`/`$name` references in
/// `prog`'s replacement template (`spec.md` §8 Scenario 2).
pub fn emit_replace_reader(name: &str, find_fn: &str, prog: &Prog, config: ChunkConfig) -> TokenStream {
    let struct_ident = ident(&format!("{name}ReplaceReader"));
    let find_ident = ident(find_fn);
    let buffer_size = config.buffer_size;
    let max_leftover = config.max_leftover;
    let num_cap = prog.num_cap;

    let group_names: Vec<(String, usize)> = (1..=prog.num_cap)
        .filter_map(|k| prog.capture_names.get(k).and_then(|n| n.as_deref()).map(|n| (n.to_string(), k)))
        .collect();
    let group_name_lits = group_names.iter().map(|(n, _)| n.as_str());
    let group_name_indices = group_names.iter().map(|(_, k)| *k);

    quote! {
        pub struct #struct_ident<R> {
            buf: regexgen_support::ChunkBuffer<R>,
            searched: usize,
            template: regexgen::template::Template,
        }

        impl<R: std::io::Read> #struct_ident<R> {
            pub fn new(reader: R, template: regexgen::template::Template, cancel: regexgen_support::CancellationToken) -> Self {
                #struct_ident {
                    buf: regexgen_support::ChunkBuffer::new(reader, #buffer_size, #max_leftover, cancel),
                    searched: 0,
                    template,
                }
            }

            /// Drains as much replaced+passthrough text as is currently
            /// committable into `out`, returning `true` once end of stream
            /// is reached and everything has been flushed.
            pub fn fill_next(&mut self, out: &mut String) -> std::io::Result<bool> {
                const GROUP_NAMES: &[(&str, usize)] = &[ #( (#group_name_lits, #group_name_indices) ),* ];

                loop {
                    self.buf.fill()?;
                    let reportable = self.buf.reportable_end();
                    let data = self.buf.data();
                    match #find_ident(&data[self.searched..]) {
                        Some(slots) => {
                            let start = self.searched + slots[0].expect("whole match always starts");
                            let end = self.searched + slots[1].expect("whole match always ends");
                            if end <= reportable {
                                out.push_str(&String::from_utf8_lossy(&data[self.searched..start]));
                                let whole = String::from_utf8_lossy(&data[start..end]);
                                let searched = self.searched;
                                let mut group_spans: [Option<(usize, usize)>; #num_cap + 1] = [None; #num_cap + 1];
                                for k in 1..=#num_cap {
                                    if let (Some(s), Some(e)) = (slots[2 * k], slots[2 * k + 1]) {
                                        group_spans[k] = Some((s, e));
                                    }
                                }
                                let group_text = |k: usize| {
                                    let (s, e) = group_spans.get(k).copied().flatten()?;
                                    std::str::from_utf8(&data[searched + s..searched + e]).ok()
                                };
                                self.template.expand_into(
                                    out,
                                    &whole,
                                    |n: usize| group_text(n),
                                    |name: &str| {
                                        GROUP_NAMES.iter().find(|(n, _)| *n == name).and_then(|(_, k)| group_text(*k))
                                    },
                                );
                                self.buf.commit(end);
                                self.searched = end;
                                continue;
                            }
                        }
                        None => {
                            if self.buf.is_eof() {
                                out.push_str(&String::from_utf8_lossy(&data[self.searched..]));
                                return Ok(true);
                            }
                        }
                    }
                    if self.buf.is_eof() {
                        out.push_str(&String::from_utf8_lossy(&data[self.searched..]));
                        return Ok(true);
                    }
                    let before = self.buf.data().len();
                    if !self.buf.slide() {
                        return Err(std::io::Error::new(
                            std::io::ErrorKind::Other,
                            "regexgen: max_leftover leaves no room to grow within buffer_size",
                        ));
                    }
                    let dropped = before - self.buf.data().len();
                    self.searched = self.searched.saturating_sub(dropped);
                }
            }
        }
    }
}

/// Emits `struct {name}SelectReader<R>`/`{name}RejectReader<R>`: line-
/// oriented filters that forward a line iff `is_match_fn(line) == keep`
/// (`spec.md` §6: `SelectReader(input, pred)`/`RejectReader(input, pred)`,
/// here specialized to the pattern's own boolean matcher as the predicate).
pub fn emit_filter_reader(name: &str, is_match_fn: &str, keep_on_match: bool, config: ChunkConfig) -> TokenStream {
    let suffix = if keep_on_match { "SelectReader" } else { "RejectReader" };
    let struct_ident = ident(&format!("{name}{suffix}"));
    let is_match_ident = ident(is_match_fn);
    let buffer_size = config.buffer_size;
    let max_leftover = config.max_leftover;

    quote! {
        pub struct #struct_ident<R> {
            buf: regexgen_support::ChunkBuffer<R>,
            searched: usize,
        }

        impl<R: std::io::Read> #struct_ident<R> {
            pub fn new(reader: R, cancel: regexgen_support::CancellationToken) -> Self {
                #struct_ident {
                    buf: regexgen_support::ChunkBuffer::new(reader, #buffer_size, #max_leftover, cancel),
                    searched: 0,
                }
            }

            /// Drains every complete, already-decided line into `out`,
            /// returning `true` once end of stream is reached and the final
            /// (possibly newline-less) line has been flushed.
            pub fn fill_next(&mut self, out: &mut Vec<u8>) -> std::io::Result<bool> {
                loop {
                    self.buf.fill()?;
                    let data = self.buf.data();
                    while let Some(rel_nl) = data[self.searched..].iter().position(|&b| b == b'\n') {
                        let end = self.searched + rel_nl + 1;
                        let line = &data[self.searched..end];
                        if #is_match_ident(line) == #keep_on_match {
                            out.extend_from_slice(line);
                        }
                        self.buf.commit(end);
                        self.searched = end;
                    }
                    if self.buf.is_eof() {
                        let tail = &self.buf.data()[self.searched..];
                        if !tail.is_empty() && #is_match_ident(tail) == #keep_on_match {
                            out.extend_from_slice(tail);
                        }
                        return Ok(true);
                    }
                    let before = self.buf.data().len();
                    if !self.buf.slide() {
                        return Err(std::io::Error::new(
                            std::io::ErrorKind::Other,
                            "regexgen: max_leftover leaves no room to grow within buffer_size",
                        ));
                    }
                    let dropped = before - self.buf.data().len();
                    self.searched = self.searched.saturating_sub(dropped);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_reader_names_its_struct_after_the_pattern() {
        let config = ChunkConfig::new(4, None, None).unwrap();
        let tokens = emit_find_reader("Email", "find_email", config);
        let rendered = tokens.to_string();
        assert!(rendered.contains("EmailFindReader"));
        assert!(rendered.contains("next_match"));
        assert!(rendered.contains("ChunkBuffer"));
    }

    #[test]
    fn filter_reader_suffix_follows_keep_on_match() {
        let config = ChunkConfig::new(4, None, None).unwrap();
        let select = emit_filter_reader("Email", "is_match_email", true, config);
        assert!(select.to_string().contains("EmailSelectReader"));
        let reject = emit_filter_reader("Email", "is_match_email", false, config);
        assert!(reject.to_string().contains("EmailRejectReader"));
    }

    #[test]
    fn replace_reader_uses_the_template_api() {
        use crate::hir_compile;

        let config = ChunkConfig::new(4, None, None).unwrap();
        let prog = hir_compile::compile(r"(?P<d>\d{2})/(?P<m>\d{2})/(?P<y>\d{4})").unwrap();
        let tokens = emit_replace_reader("Date", "find_date_slots", &prog, config);
        let rendered = tokens.to_string();
        assert!(rendered.contains("DateReplaceReader"));
        assert!(rendered.contains("expand_into"));
        assert!(rendered.contains("GROUP_NAMES"));
        assert!(rendered.contains("\"d\""));
        assert!(rendered.contains("\"y\""));
    }
}
