/*!
Translates a `regex_syntax::hir::Hir` into [`crate::inst::Prog`].

`spec.md` treats the instruction program as something handed to the
generator by an external parser; no such "Perl-regex -> flat instruction
program" crate exists to depend on, so this module is that compiler. The
approach — push instructions in program order, leave `Split`/`Jump`-shaped
holes for forward references, patch them once the target index is known —
is lifted directly from the old `rust-lang/regex` AST compiler (see
`zmbush-regex/src/compile.rs`, vendored in the retrieval pack this crate
was built from), adapted to walk HIR instead of the legacy `Expr` AST and
to target this crate's `Inst` shape (`out`/`arg` embedded in each variant
rather than separate `Jump`/`Split` opcodes).
*/

use regex_syntax::hir::{self, Hir, HirKind};

use crate::error::PatternError;
use crate::inst::{alloc_ranges::RuneRange, EmptyFlags, Inst, InstIdx, Prog};

/// Compiles `pattern` into a [`Prog`].
pub fn compile(pattern: &str) -> Result<Prog, PatternError> {
    let hir = regex_syntax::Parser::new()
        .parse(pattern)
        .map_err(|e| PatternError::new(pattern, e))?;
    let mut c = Compiler::new();
    c.insts.push(Inst::Capture { slot: 0, out: 0 }); // patched below
    c.compile_hir(&hir);
    let end = c.insts.len();
    c.insts.push(Inst::Capture { slot: 1, out: end + 1 });
    c.insts.push(Inst::Match);
    patch_out(&mut c.insts, 0, 1);

    let prog = Prog {
        insts: c.insts,
        start: 0,
        num_cap: c.num_cap,
        capture_names: c.cap_names,
        original: pattern.to_string(),
    };
    #[cfg(debug_assertions)]
    prog.check_invariants();
    Ok(prog)
}

/// Patches instruction `idx`'s `out` field in place. Every `Inst` variant
/// that can serve as a compiler-created hole (`Nop`, `Alt`'s `out`, and the
/// wrapper `Capture`) is covered; anything else is a bug in this module.
fn patch_out(insts: &mut [Inst], idx: InstIdx, to: InstIdx) {
    match &mut insts[idx] {
        Inst::Nop { out }
        | Inst::Rune1 { out, .. }
        | Inst::Rune { out, .. }
        | Inst::RuneAny { out }
        | Inst::RuneAnyNotNL { out }
        | Inst::AltMatch { out }
        | Inst::Capture { out, .. }
        | Inst::EmptyWidth { out, .. } => *out = to,
        Inst::Alt { out, .. } => *out = to,
        Inst::Match | Inst::Fail => unreachable!("cannot patch a terminal instruction"),
    }
}

fn patch_arg(insts: &mut [Inst], idx: InstIdx, to: InstIdx) {
    match &mut insts[idx] {
        Inst::Alt { arg, .. } => *arg = to,
        _ => unreachable!("cannot patch `arg` on a non-Alt instruction"),
    }
}

struct Compiler {
    insts: Vec<Inst>,
    cap_names: Vec<Option<Box<str>>>,
    num_cap: usize,
}

impl Compiler {
    fn new() -> Compiler {
        Compiler { insts: Vec::new(), cap_names: vec![None], num_cap: 0 }
    }

    /// Appends an empty (self-looping) `Nop`, returning its index so a
    /// caller can patch it once the real successor is known. This stands in
    /// for the old compiler's `empty_jump`.
    fn hole(&mut self) -> InstIdx {
        let idx = self.insts.len();
        self.insts.push(Inst::Nop { out: idx });
        idx
    }

    /// Appends an empty `Alt`, returning its index so a caller can patch
    /// both branches once known. Stands in for `empty_split`.
    fn hole_alt(&mut self) -> InstIdx {
        let idx = self.insts.len();
        self.insts.push(Inst::Alt { out: idx, arg: idx });
        idx
    }

    fn next_idx(&self) -> InstIdx {
        self.insts.len()
    }

    fn compile_hir(&mut self, hir: &Hir) {
        match hir.kind() {
            HirKind::Empty => {}
            HirKind::Literal(hir::Literal(bytes)) => {
                for &b in bytes.iter() {
                    let idx = self.insts.len();
                    self.insts.push(Inst::Rune1 { byte: b, out: idx + 1 });
                }
            }
            HirKind::Class(class) => self.compile_class(class),
            HirKind::Look(look) => self.compile_look(*look),
            HirKind::Capture(cap) => {
                let group = cap.index as usize;
                self.num_cap = self.num_cap.max(group);
                while self.cap_names.len() <= group {
                    self.cap_names.push(None);
                }
                self.cap_names[group] = cap.name.as_ref().map(|n| n.as_str().into());
                let start_idx = self.insts.len();
                self.insts.push(Inst::Capture { slot: 2 * group, out: start_idx + 1 });
                self.compile_hir(&cap.sub);
                let end_idx = self.insts.len();
                self.insts.push(Inst::Capture { slot: 2 * group + 1, out: end_idx + 1 });
            }
            HirKind::Concat(subs) => {
                for sub in subs {
                    self.compile_hir(sub);
                }
            }
            HirKind::Alternation(subs) => self.compile_alternation(subs),
            HirKind::Repetition(rep) => self.compile_repetition(rep),
        }
    }

    fn compile_class(&mut self, class: &hir::Class) {
        let ranges = ascii_ranges(class);
        let idx = self.insts.len();
        match ranges.as_slice() {
            [] => self.insts.push(Inst::Fail),
            [single] if single.start == single.end => {
                self.insts.push(Inst::Rune1 { byte: single.start, out: idx + 1 })
            }
            _ => self.insts.push(Inst::Rune { ranges, out: idx + 1 }),
        }
    }

    fn compile_look(&mut self, look: hir::Look) {
        let flags = match look {
            hir::Look::Start => EmptyFlags::TEXT_START,
            hir::Look::End => EmptyFlags::TEXT_END,
            hir::Look::StartLF | hir::Look::StartCRLF => EmptyFlags::LINE_START,
            hir::Look::EndLF | hir::Look::EndCRLF => EmptyFlags::LINE_END,
            hir::Look::WordAscii | hir::Look::WordUnicode => EmptyFlags::WORD_BOUNDARY,
            hir::Look::WordAsciiNegate | hir::Look::WordUnicodeNegate => {
                EmptyFlags::NOT_WORD_BOUNDARY
            }
            _ => EmptyFlags::empty(),
        };
        let idx = self.insts.len();
        self.insts.push(Inst::EmptyWidth { flags, out: idx + 1 });
    }

    fn compile_alternation(&mut self, subs: &[Hir]) {
        match subs {
            [] => {}
            [one] => self.compile_hir(one),
            [first, rest @ ..] => {
                let split = self.hole_alt();
                let j1 = self.next_idx();
                self.compile_hir(first);
                let jmp = self.hole();
                let j2 = self.next_idx();
                // the remaining alternatives recurse as a right-leaning chain,
                // exactly mirroring the old compiler's `Alternate(es)` handling.
                let rest_hir = Hir::alternation(rest.to_vec());
                self.compile_hir(&rest_hir);
                let j3 = self.next_idx();
                patch_out(&mut self.insts, split, j1);
                patch_arg(&mut self.insts, split, j2);
                patch_out(&mut self.insts, jmp, j3);
            }
        }
    }

    fn compile_repetition(&mut self, rep: &hir::Repetition) {
        match (rep.min, rep.max, rep.greedy) {
            (0, Some(1), greedy) => {
                let split = self.hole_alt();
                let j1 = self.next_idx();
                self.compile_hir(&rep.sub);
                let j2 = self.next_idx();
                self.set_split_order(split, j1, j2, greedy);
            }
            (0, None, greedy) => {
                let j1 = self.next_idx();
                let split = self.hole_alt();
                let j2 = self.next_idx();
                self.compile_hir(&rep.sub);
                let jmp = self.hole();
                let j3 = self.next_idx();
                patch_out(&mut self.insts, jmp, j1);
                self.set_split_order(split, j2, j3, greedy);
            }
            (1, None, greedy) => {
                let j1 = self.next_idx();
                self.compile_hir(&rep.sub);
                let split = self.hole_alt();
                let j2 = self.next_idx();
                self.set_split_order(split, j1, j2, greedy);
            }
            (min, max, greedy) => {
                for _ in 0..min {
                    self.compile_hir(&rep.sub);
                }
                match max {
                    None => self.compile_repetition(&hir::Repetition {
                        min: 0,
                        max: None,
                        greedy,
                        sub: rep.sub.clone(),
                    }),
                    Some(max) => {
                        for _ in min..max {
                            self.compile_repetition(&hir::Repetition {
                                min: 0,
                                max: Some(1),
                                greedy,
                                sub: rep.sub.clone(),
                            });
                        }
                    }
                }
            }
        }
    }

    /// `Alt.out` is the greedy branch; for a non-greedy quantifier the
    /// branches are simply swapped.
    fn set_split_order(&mut self, split: InstIdx, consume: InstIdx, skip: InstIdx, greedy: bool) {
        if greedy {
            patch_out(&mut self.insts, split, consume);
            patch_arg(&mut self.insts, split, skip);
        } else {
            patch_out(&mut self.insts, split, skip);
            patch_arg(&mut self.insts, split, consume);
        }
    }
}

/// Reduces an HIR class to ASCII byte ranges.
///
/// Full Unicode class support is out of this generator's scope (`spec.md`
/// Non-goals: "Unicode word-boundary semantics beyond ASCII" — by extension
/// the engines in this crate are only ever asked to test single bytes, so
/// general Unicode scalar ranges are intersected down to `0..=0x7F`). A
/// pattern whose class is entirely outside ASCII compiles to `Inst::Fail`
/// for that branch, which is correct (if unhelpful) rather than silently
/// wrong.
fn ascii_ranges(class: &hir::Class) -> Vec<RuneRange> {
    let mut out = Vec::new();
    match class {
        hir::Class::Unicode(u) => {
            for r in u.ranges() {
                let (s, e) = (r.start() as u32, r.end() as u32);
                if s > 0x7F {
                    continue;
                }
                out.push(RuneRange::new(s as u8, e.min(0x7F) as u8));
            }
        }
        hir::Class::Bytes(b) => {
            for r in b.ranges() {
                out.push(RuneRange::new(r.start(), r.end()));
            }
        }
    }
    out.sort();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inst::Inst;

    #[test]
    fn literal_compiles_one_rune1_per_byte() {
        let prog = compile("ab").unwrap();
        let lits: Vec<u8> = prog
            .insts
            .iter()
            .filter_map(|i| match i {
                Inst::Rune1 { byte, .. } => Some(*byte),
                _ => None,
            })
            .collect();
        assert_eq!(lits, vec![b'a', b'b']);
    }

    #[test]
    fn capture_groups_are_named() {
        let prog = compile(r"(?P<year>\d{4})-(?P<month>\d{2})").unwrap();
        assert_eq!(prog.num_cap, 2);
        assert_eq!(prog.capture_names[1].as_deref(), Some("year"));
        assert_eq!(prog.capture_names[2].as_deref(), Some("month"));
    }

    #[test]
    fn alternation_has_two_reachable_branches() {
        let prog = compile("cat|dog").unwrap();
        let has_c = prog.insts.iter().any(|i| matches!(i, Inst::Rune1 { byte: b'c', .. }));
        let has_d = prog.insts.iter().any(|i| matches!(i, Inst::Rune1 { byte: b'd', .. }));
        assert!(has_c && has_d);
    }

    #[test]
    fn star_contains_an_alt() {
        let prog = compile("a*").unwrap();
        assert!(prog.insts.iter().any(|i| matches!(i, Inst::Alt { .. })));
    }
}
