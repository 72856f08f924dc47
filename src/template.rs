/*!
Replacement templates (`spec.md` §4.5/§6): pre-segmented literal/capture
templates used by the `Replace`-flavored streaming transforms and by
one-shot `replace`/`replace_all`-style generated helpers.

Grounded on the teacher's `Replacer`/`CaptureRef` machinery (the
`$name`/`${name}`/`$1` expansion rules documented in the crate-level docs
of `regex-automata`'s sibling `regex` crate, and exercised throughout
`regex-cli`'s `find replace` subcommand): a template is parsed once into a
`Vec<Segment>`, each `CaptureRef` segment resolved against a name table at
construction time, so per-replacement work is just a walk over the
segment list.

This resolves `spec.md` §9 Open Question (a): a runtime-invalid group
reference degrades to leaving that segment empty rather than panicking;
only construction-time resolution against a *known* name table can fail
(`TemplateError`), and only when a precompiled, named-group-aware template
is requested.
*/

use crate::error::{TemplateError, TemplateErrorRef};

/// One piece of a parsed replacement template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    FullMatch,
    CaptureByIndex(usize),
    CaptureByName(String),
}

/// A parsed, segment-resolved replacement template.
#[derive(Clone, Debug)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parses `pattern` into segments without resolving names against a
    /// capture table (`spec.md` §4.5: pure parsing is always infallible;
    /// name resolution is a separate, optional step).
    ///
    /// Recognizes `$$` (literal `$`), `$N` (decimal group index), `${N}`,
    /// `$name`, and `${name}`, matching the teacher's `regex` crate
    /// replacement syntax.
    pub fn parse(template: &str) -> Template {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices().peekable();
        while let Some((_, c)) = chars.next() {
            if c != '$' {
                literal.push(c);
                continue;
            }
            match chars.peek().copied() {
                Some((_, '$')) => {
                    chars.next();
                    literal.push('$');
                }
                Some((_, '{')) => {
                    chars.next();
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        literal.push_str("${");
                        literal.push_str(&name);
                        continue;
                    }
                    flush_literal(&mut segments, &mut literal);
                    segments.push(reference_segment(&name));
                }
                Some((_, c0)) if c0.is_ascii_digit() || c0 == '_' || c0.is_alphabetic() => {
                    let mut name = String::new();
                    while let Some((_, c)) = chars.peek().copied() {
                        if c.is_alphanumeric() || c == '_' {
                            name.push(c);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    flush_literal(&mut segments, &mut literal);
                    segments.push(reference_segment(&name));
                }
                _ => literal.push('$'),
            }
        }
        flush_literal(&mut segments, &mut literal);
        Template { segments }
    }

    /// Validates every [`Segment::CaptureByIndex`]/[`Segment::CaptureByName`]
    /// against `group_count`/`resolve_name`, returning the first unresolvable
    /// reference as an error (`spec.md` §7: "Template-invalid ... construction
    /// returns an error before any matching").
    pub fn resolve(
        self,
        group_count: usize,
        resolve_name: impl Fn(&str) -> Option<usize>,
    ) -> Result<Template, TemplateError> {
        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                Segment::CaptureByIndex(n) if *n > group_count => {
                    return Err(TemplateError { segment_index: i, reference: TemplateErrorRef::Index(*n) })
                }
                Segment::CaptureByName(name) if resolve_name(name).is_none() => {
                    return Err(TemplateError {
                        segment_index: i,
                        reference: TemplateErrorRef::Name(name.clone()),
                    })
                }
                _ => {}
            }
        }
        Ok(self)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Expands the template against one match, appending into `out`. A
    /// reference to a group that did not participate in this particular
    /// match (or, for an unresolved/runtime template, does not exist at
    /// all) contributes nothing, per `spec.md` §9 Open Question (a).
    pub fn expand_into<'a>(
        &self,
        out: &mut String,
        whole_match: &str,
        group: impl Fn(usize) -> Option<&'a str>,
        group_by_name: impl Fn(&str) -> Option<&'a str>,
    ) {
        for seg in &self.segments {
            match seg {
                Segment::Literal(s) => out.push_str(s),
                Segment::FullMatch => out.push_str(whole_match),
                Segment::CaptureByIndex(n) => {
                    if let Some(s) = group(*n) {
                        out.push_str(s);
                    }
                }
                Segment::CaptureByName(name) => {
                    if let Some(s) = group_by_name(name) {
                        out.push_str(s);
                    }
                }
            }
        }
    }
}

fn flush_literal(segments: &mut Vec<Segment>, literal: &mut String) {
    if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(literal)));
    }
}

fn reference_segment(name: &str) -> Segment {
    if name == "0" {
        Segment::FullMatch
    } else if let Ok(n) = name.parse::<usize>() {
        Segment::CaptureByIndex(n)
    } else {
        Segment::CaptureByName(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_text_passes_through_untouched() {
        let t = Template::parse("no references here");
        assert_eq!(t.segments(), &[Segment::Literal("no references here".into())]);
    }

    #[test]
    fn dollar_dollar_is_a_literal_dollar() {
        let t = Template::parse("cost: $$5");
        assert_eq!(t.segments(), &[Segment::Literal("cost: $5".into())]);
    }

    #[test]
    fn numeric_and_named_references_are_recognized() {
        let t = Template::parse("$1-${name}-$0");
        assert_eq!(
            t.segments(),
            &[
                Segment::CaptureByIndex(1),
                Segment::Literal("-".into()),
                Segment::CaptureByName("name".into()),
                Segment::Literal("-".into()),
                Segment::FullMatch,
            ]
        );
    }

    #[test]
    fn resolve_rejects_out_of_range_index() {
        let t = Template::parse("$5");
        let err = t.resolve(2, |_| None).unwrap_err();
        assert!(format!("{err}").contains("group 5"));
    }

    #[test]
    fn resolve_rejects_unknown_name() {
        let t = Template::parse("${nope}");
        let err = t.resolve(2, |_| None).unwrap_err();
        assert!(format!("{err}").contains("nope"));
    }

    #[test]
    fn expand_skips_nonparticipating_groups() {
        let t = Template::parse("[$1]");
        let mut out = String::new();
        t.expand_into(&mut out, "whole", |_| None, |_| None);
        assert_eq!(out, "[]");
    }
}
