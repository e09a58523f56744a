use std::borrow::Cow;

use crate::loader::log::LogSink;
use crate::loader::{Context, Span};

use super::lexer::Token as T;
use crate::loader::Spanned as S;

use super::ast::*;
use super::lexer::Lexer;

pub struct Parser<'a, 'b> {
    lexer: Lexer<'a>,
    peek: Option<S<T<'a>>>,
    ctx: &'b mut Context<'a>,
}

impl<'a, 'b> Parser<'a, 'b> {
    pub fn new(ctx: &'b mut Context<'a>) -> Self {
        Parser {
            lexer: Lexer::new(ctx.src()),
            ctx,
            peek: None,
        }
    }

    fn next_token_optional(&mut self) -> Option<S<T<'a>>> {
        if let Some(peek) = self.peek.take() {
            return Some(peek);
        }
        loop {
            match self.lexer.next() {
                Some(S(Ok(T::Comment(_) | T::Declaration(_)), _)) => {}
                Some(S(Ok(ok), r)) => return Some(S(ok, r)),
                Some(S(Err(err), span)) => _ = self.ctx.emit_error(format!("lexer: {err}"), span),
                None => return None,
            }
        }
    }

    fn peek_token_optional(&mut self) -> Option<S<T<'a>>> {
        if self.peek.is_none() {
            self.peek = self.next_token_optional();
        }
        self.peek
    }

    fn expect_token(&mut self, expected: T<'a>) -> (bool, Span) {
        match self.peek_token_optional() {
            Some(S(token, span)) if token == expected => {
                self.next_token_optional();
                (true, span)
            }
            Some(S(token, span)) => {
                self.ctx
                    .emit_error(format!("unexpected {token:#} expected {expected}"), span);
                (false, span)
            }
            None => {
                let eof = self.ctx.eof();
                self.ctx
                    .emit_error(format!("unexpected end of input expected {expected}"), eof);
                (false, eof)
            }
        }
    }

    /// Parses the single root element, ignoring the prolog and any
    /// surrounding whitespace.
    pub fn parse_document(&mut self) -> Option<S<Element<'a>>> {
        let mut root = None;
        while let Some(S(token, span)) = self.next_token_optional() {
            match token {
                T::Text(text) if text.trim().is_empty() => {}
                T::Open(name) if root.is_none() => root = Some(self.parse_element(S(name, span))),
                T::Open(name) => {
                    self.ctx
                        .emit_error(format!("second root element <{name}>"), span);
                    self.parse_element(S(name, span));
                }
                got => _ = self.ctx.emit_error(format!("unexpected {got:#} outside the root element"), span),
            }
        }
        if root.is_none() {
            self.ctx.emit_error_locless("document has no root element");
        }
        root
    }

    fn parse_attribute(&mut self, name: S<&'a str>) -> Option<Attribute<'a>> {
        if !self.expect_token(T::Eq).0 {
            return None;
        }
        match self.next_token_optional() {
            Some(S(T::Quoted(raw), span)) => {
                let inner = Span(span.0 + 1, span.1.saturating_sub(1));
                Some(Attribute {
                    name,
                    value: S(unescape(raw, inner, self.ctx), span),
                })
            }
            Some(S(got, span)) => {
                self.ctx
                    .emit_error(format!("unexpected {got:#} expected quoted value"), span);
                None
            }
            None => {
                let eof = self.ctx.eof();
                self.ctx.emit_error("unexpected end of input", eof);
                None
            }
        }
    }

    /// Parses an element whose `<name` token has already been consumed.
    fn parse_element(&mut self, name: S<&'a str>) -> S<Element<'a>> {
        let start = name.1;
        let mut element = Element::new(name);

        loop {
            match self.next_token_optional() {
                Some(S(T::Ident(attr), span)) => {
                    if let Some(attribute) = self.parse_attribute(S(attr, span)) {
                        element.attributes.push(attribute);
                    }
                }
                Some(S(T::SelfClose, end)) => return S(element, start.join(end)),
                Some(S(T::End, _)) => break,
                Some(S(got, span)) => {
                    self.ctx.emit_error(
                        format!("unexpected {got:#} expected attribute or {}", T::End),
                        span,
                    );
                    return S(element, start.join(span));
                }
                None => {
                    self.unclosed(&element);
                    let eof = self.ctx.eof();
                    return S(element, start.join(eof));
                }
            }
        }

        loop {
            match self.next_token_optional() {
                Some(S(T::Text(raw), span)) => element
                    .children
                    .push(S(Node::Text(unescape(raw, span, self.ctx)), span)),
                Some(S(T::CData(data), span)) => element
                    .children
                    .push(S(Node::Text(Cow::Borrowed(data)), span)),
                Some(S(T::Open(child), span)) => {
                    let child = self.parse_element(S(child, span));
                    element.children.push(child.map(Node::Element));
                }
                Some(S(T::Close(closing), span)) => {
                    if closing != element.name.0 {
                        self.ctx
                            .emit_error(
                                format!("mismatched closing tag </{closing}>"),
                                span,
                            )
                            .emit_help_locless(format!("expected </{}>", element.name.0));
                    }
                    let (_, end) = self.expect_token(T::End);
                    return S(element, start.join(end));
                }
                Some(S(got, span)) => {
                    _ = self
                        .ctx
                        .emit_error(format!("unexpected {got:#} inside <{}>", element.name.0), span)
                }
                None => {
                    self.unclosed(&element);
                    let eof = self.ctx.eof();
                    return S(element, start.join(eof));
                }
            }
        }
    }

    fn unclosed(&mut self, element: &Element<'a>) {
        self.ctx
            .emit_error(format!("unclosed tag <{}>", element.name.0), element.name.1);
    }
}

/// Decodes the predefined and numeric character references in `raw`, which
/// starts at `span.0` in the source. Unknown references are kept verbatim
/// with a warning.
pub fn unescape<'a>(raw: &'a str, span: Span, ctx: &mut impl LogSink) -> Cow<'a, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let (name, terminated) = match rest[1..].find([';', '&']) {
            Some(index) => (&rest[1..=index], rest[1 + index..].starts_with(';')),
            None => (&rest[1..], false),
        };
        match terminated.then(|| decode(name)).flatten() {
            Some(c) => {
                out.push(c);
                rest = &rest[name.len() + 2..];
            }
            None => {
                let offset = span.0 + (raw.len() - rest.len());
                let len = 1 + name.len() + usize::from(terminated);
                ctx.emit_warning("unknown character reference", Span(offset, offset + len));
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        num => {
            let code = match num.strip_prefix("#x").or_else(|| num.strip_prefix("#X")) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => num.strip_prefix('#').and_then(|dec| dec.parse().ok()),
            };
            char::from_u32(code?)
        }
    }
}

/// Parses `ctx`'s source into its root element. Errors are left in `ctx`.
pub fn parse<'a>(ctx: &mut Context<'a>) -> Option<S<Element<'a>>> {
    Parser::new(ctx).parse_document()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::log::Logs;

    #[test]
    fn nested_document() {
        let src = r#"<?xml version="1.0"?>
<!--JFLAP-->
<structure>
    <type>fa</type>
    <automaton>
        <state id="0" name="q&amp;0"><initial/></state>
    </automaton>
</structure>"#;
        let mut ctx = Context::new(src);
        let S(root, _) = parse(&mut ctx).unwrap();
        assert!(!ctx.contains_errors());

        assert_eq!(root.name.0, "structure");
        assert_eq!(root.child("type").unwrap().0.text(), "fa");
        let automaton = root.child("automaton").unwrap().0;
        let state = automaton.child("state").unwrap().0;
        assert_eq!(state.attribute("id").unwrap().0, "0");
        assert_eq!(state.attribute("name").unwrap().0, "q&0");
        assert!(state.has_child("initial"));
    }

    #[test]
    fn entities() {
        let mut logs = Logs::new();
        let span = Span(0, 0);
        assert!(matches!(unescape("plain", span, &mut logs), Cow::Borrowed("plain")));
        assert_eq!(unescape("&lt;&gt;&quot;&apos;&amp;", span, &mut logs), "<>\"'&");
        assert_eq!(unescape("&#949;&#x3BB;", span, &mut logs), "ελ");
        assert!(!logs.contains_errors());
        assert!(logs.entries().is_empty());

        assert_eq!(unescape("a&b&nbsp;", Span(10, 19), &mut logs), "a&b&nbsp;");
        assert_eq!(logs.entries().len(), 2);
        assert_eq!(logs.entries()[0].span, Some(Span(11, 13)));
        assert_eq!(logs.entries()[1].span, Some(Span(13, 19)));
    }

    #[test]
    fn mismatched_close() {
        let mut ctx = Context::new("<a><b></a>");
        parse(&mut ctx);
        assert!(ctx.contains_errors());
        let messages = ctx.logs().error_messages();
        assert_eq!(messages[0], "mismatched closing tag </a> (expected </b>)");
        assert_eq!(messages[1], "unclosed tag <a>");
    }

    #[test]
    fn unclosed_and_empty() {
        let mut ctx = Context::new("<structure><type>fa</type>");
        parse(&mut ctx);
        assert_eq!(ctx.logs().error_messages(), ["unclosed tag <structure>"]);

        let mut ctx = Context::new("  <!-- only a comment -->  ");
        assert!(parse(&mut ctx).is_none());
        assert_eq!(ctx.logs().error_messages(), ["document has no root element"]);
    }

    #[test]
    fn cdata_is_literal() {
        let mut ctx = Context::new("<read><![CDATA[&lt;]]></read>");
        let S(root, span) = parse(&mut ctx).unwrap();
        assert_eq!(root.text(), "&lt;");
        assert_eq!(span, Span(0, 29));
    }
}
