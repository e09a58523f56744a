use crate::loader::{Span, Spanned};

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
pub enum Token<'a> {
    /// `<name`
    Open(&'a str),
    /// `</name`
    Close(&'a str),
    /// `>`
    End,
    /// `/>`
    SelfClose,
    Eq,

    Ident(&'a str),
    /// Attribute value without its quotes, entities still encoded.
    Quoted(&'a str),
    /// Character data between tags, entities still encoded.
    Text(&'a str),
    CData(&'a str),

    Comment(&'a str),
    /// `<?..?>` and `<!..>`
    Declaration(&'a str),
}

impl<'a> std::fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Open(name) if f.alternate() => write!(f, "'<{name}'"),
            Token::Open(_) => write!(f, "opening tag"),
            Token::Close(name) if f.alternate() => write!(f, "'</{name}'"),
            Token::Close(_) => write!(f, "closing tag"),
            Token::End => write!(f, "'>'"),
            Token::SelfClose => write!(f, "'/>'"),
            Token::Eq => write!(f, "'='"),
            Token::Ident(ident) if f.alternate() => write!(f, "{ident:?}"),
            Token::Ident(_) => write!(f, "name"),
            Token::Quoted(_) => write!(f, "quoted value"),
            Token::Text(_) => write!(f, "text"),
            Token::CData(_) => write!(f, "<![CDATA[..]]>"),
            Token::Comment(_) => write!(f, "<comment>"),
            Token::Declaration(_) => write!(f, "<declaration>"),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
    in_tag: bool,
}

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
pub enum Error {
    InvalidChar(char),
    MissingName,
    UnclosedComment,
    UnclosedDeclaration,
    UnclosedCData,
    UnclosedQuote,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidChar(c) => write!(f, "invalid character {c:?}"),
            Error::MissingName => write!(f, "expected a tag name after '<'"),
            Error::UnclosedComment => write!(f, "unclosed comment"),
            Error::UnclosedDeclaration => write!(f, "unclosed declaration"),
            Error::UnclosedCData => write!(f, "unclosed CDATA section"),
            Error::UnclosedQuote => write!(f, "unclosed attribute value"),
        }
    }
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            position: 0,
            in_tag: false,
        }
    }

    fn consume(&mut self) -> Option<char> {
        let next = self.input.get(self.position..)?.chars().next()?;
        self.position += next.len_utf8();
        Some(next)
    }

    fn peek(&mut self) -> Option<char> {
        self.input.get(self.position..)?.chars().next()
    }

    fn backtrack(&mut self) {
        if let Some(consumed) = self.input.get(..self.position)
            && let Some(previous) = consumed.chars().next_back()
        {
            self.position -= previous.len_utf8();
        }
    }

    fn rest(&self) -> &'a str {
        self.input.get(self.position..).unwrap_or("")
    }

    /// Skips past `terminator`, returning everything before it. Without a
    /// terminator the rest of the input is consumed.
    fn take_until(&mut self, terminator: &str) -> Option<&'a str> {
        let rest = self.rest();
        let Some(index) = rest.find(terminator) else {
            self.position = self.input.len();
            return None;
        };
        self.position += index + terminator.len();
        Some(&rest[..index])
    }

    fn name(&mut self) -> &'a str {
        let start = self.position;
        while let Some(c) = self.consume() {
            if !continue_name(c) {
                self.backtrack();
                break;
            }
        }
        &self.input[start..self.position]
    }

    fn markup(&mut self) -> Result<Token<'a>, Error> {
        let rest = self.rest();
        if rest.starts_with("!--") {
            self.position += 3;
            return self
                .take_until("-->")
                .map(Token::Comment)
                .ok_or(Error::UnclosedComment);
        }
        if rest.starts_with("![CDATA[") {
            self.position += 8;
            return self
                .take_until("]]>")
                .map(Token::CData)
                .ok_or(Error::UnclosedCData);
        }
        match self.peek() {
            Some('?') => {
                self.consume();
                self.take_until("?>")
                    .map(Token::Declaration)
                    .ok_or(Error::UnclosedDeclaration)
            }
            Some('!') => {
                self.consume();
                self.take_until(">")
                    .map(Token::Declaration)
                    .ok_or(Error::UnclosedDeclaration)
            }
            Some('/') => {
                self.consume();
                self.tag_name().map(Token::Close)
            }
            _ => self.tag_name().map(Token::Open),
        }
    }

    fn tag_name(&mut self) -> Result<&'a str, Error> {
        match self.peek() {
            Some(c) if begin_name(c) => {
                self.in_tag = true;
                Ok(self.name())
            }
            _ => Err(Error::MissingName),
        }
    }

    fn in_tag(&mut self) -> Option<Result<Token<'a>, Error>> {
        let res = match self.consume()? {
            '>' => {
                self.in_tag = false;
                Ok(Token::End)
            }
            '/' => match self.peek() {
                Some('>') => {
                    self.consume();
                    self.in_tag = false;
                    Ok(Token::SelfClose)
                }
                _ => Err(Error::InvalidChar('/')),
            },
            '=' => Ok(Token::Eq),
            quote @ ('"' | '\'') => {
                let rest = self.rest();
                match rest.find(quote) {
                    Some(index) => {
                        self.position += index + 1;
                        Ok(Token::Quoted(&rest[..index]))
                    }
                    None => {
                        self.position = self.input.len();
                        Err(Error::UnclosedQuote)
                    }
                }
            }
            c if begin_name(c) => {
                self.backtrack();
                Ok(Token::Ident(self.name()))
            }
            c => Err(Error::InvalidChar(c)),
        };
        Some(res)
    }
}

fn begin_name(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == ':'
}

fn continue_name(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.')
}

impl<'a> std::iter::Iterator for Lexer<'a> {
    type Item = Spanned<Result<Token<'a>, Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.in_tag {
            while let Some(c) = self.peek()
                && c.is_whitespace()
            {
                self.consume();
            }
            let start = self.position;
            let res = self.in_tag()?;
            return Some(Spanned(res, Span(start, self.position)));
        }

        let start = self.position;
        let res = match self.consume()? {
            '<' => self.markup(),
            _ => {
                let text = match self.rest().find('<') {
                    Some(index) => index,
                    None => self.rest().len(),
                };
                self.position += text;
                Ok(Token::Text(&self.input[start..self.position]))
            }
        };
        Some(Spanned(res, Span(start, self.position)))
    }
}
