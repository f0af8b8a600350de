//! Recursive-descent parser for the concrete-data subset of CUE.

use std::collections::HashSet;

use super::{
    Attribute, Decl, DeclKind, Document, Element, Field, FieldAttribute, Label, ListLit, Scalar,
    StructLit, Value,
};
use crate::error::ParseError;

type Result<T> = std::result::Result<T, ParseError>;

pub(super) struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub(super) fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    pub(super) fn document(mut self) -> Result<Document> {
        let (decls, trailing) = self.decls(None)?;
        Ok(Document { decls, trailing })
    }

    /// Decode a lone double-quoted string literal such as `"a\/b"`.
    pub(super) fn string_literal(mut self) -> Result<String> {
        if self.peek() != Some('"') {
            return Err(self.syntax(self.found("string literal")));
        }
        let decoded = self.string()?;
        if self.pos != self.src.len() {
            return Err(self.syntax(self.found("end of string literal")));
        }
        Ok(decoded)
    }

    /// Parse declarations until `close` (or end of input when `None`).
    ///
    /// Returns the declarations and the trivia before the terminator.
    fn decls(&mut self, close: Option<char>) -> Result<(Vec<Decl>, String)> {
        let mut decls = Vec::new();
        let mut labels = HashSet::new();
        loop {
            let leading = self.trivia();
            match (self.peek(), close) {
                (None, None) => return Ok((decls, leading)),
                (None, Some(c)) => return Err(self.syntax(format!("expected '{c}'"))),
                (Some(c), Some(expected)) if c == expected => {
                    self.bump();
                    return Ok((decls, leading));
                }
                _ => {}
            }

            let line = self.line_col().0;
            let kind = self.decl(decls.is_empty() && close.is_none())?;
            if let DeclKind::Field(field) = &kind {
                if !labels.insert(field.label.name.clone()) {
                    return Err(ParseError::DuplicateLabel {
                        label: field.label.name.clone(),
                        line,
                    });
                }
            }
            decls.push(Decl { leading, kind });
        }
    }

    fn decl(&mut self, allow_package: bool) -> Result<DeclKind> {
        if self.peek() == Some('@') {
            return Ok(DeclKind::Attribute(self.attribute()?));
        }
        if let Some(keyword) = self.peek_identifier() {
            match keyword {
                "package" if !self.followed_by_colon(keyword.len()) => {
                    if !allow_package {
                        return Err(self.syntax("package clause must come first".to_string()));
                    }
                    return self.package();
                }
                "import" if !self.followed_by_colon(keyword.len()) => {
                    return Err(self.unsupported("import declaration"));
                }
                _ => {}
            }
        }
        Ok(DeclKind::Field(self.field()?))
    }

    fn package(&mut self) -> Result<DeclKind> {
        let start = self.pos;
        self.pos += "package".len();
        let ws = self.inline_ws();
        if ws.is_empty() || self.identifier().is_none() {
            return Err(self.syntax("expected package name".to_string()));
        }
        Ok(DeclKind::Package(self.src[start..self.pos].to_string()))
    }

    fn field(&mut self) -> Result<Field> {
        let label = self.label()?;

        let colon_start = self.pos;
        self.inline_ws();
        match self.peek() {
            Some(':') => self.bump(),
            Some('?') | Some('!') => return Err(self.unsupported("optional or required field")),
            _ => return Err(self.syntax(format!("expected ':' after label {}", label.raw))),
        }
        self.inline_ws();
        let colon = self.src[colon_start..self.pos].to_string();

        let value = self.value()?;

        let mut attrs = Vec::new();
        loop {
            let save = self.pos;
            let leading = self.inline_ws().to_string();
            if self.peek() == Some('@') {
                attrs.push(FieldAttribute {
                    leading,
                    attr: self.attribute()?,
                });
            } else {
                self.pos = save;
                break;
            }
        }

        Ok(Field {
            label,
            colon,
            value,
            attrs,
        })
    }

    fn label(&mut self) -> Result<Label> {
        let start = self.pos;
        match self.peek() {
            Some('"') => {
                let name = self.string()?;
                Ok(Label {
                    name,
                    raw: self.src[start..self.pos].to_string(),
                })
            }
            Some('#') => Err(self.unsupported("definition")),
            _ => match self.identifier() {
                Some(name) => Ok(Label {
                    name: name.to_string(),
                    raw: name.to_string(),
                }),
                None => Err(self.syntax(self.found("a field label"))),
            },
        }
    }

    fn value(&mut self) -> Result<Value> {
        match self.peek() {
            Some('{') => {
                self.bump();
                let (decls, closing) = self.decls(Some('}'))?;
                Ok(Value::Struct(StructLit {
                    braced: true,
                    decls,
                    closing,
                }))
            }
            Some('[') => {
                self.bump();
                self.list()
            }
            Some('"') => {
                let len = self.string_len()?;
                if self.followed_by_colon(len) {
                    return self.shorthand();
                }
                let start = self.pos;
                let s = self.string()?;
                Ok(Value::Scalar(Scalar {
                    raw: self.src[start..self.pos].to_string(),
                    value: serde_json::Value::String(s),
                }))
            }
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some(_) => match self.peek_identifier() {
                Some(ident) if self.followed_by_colon(ident.len()) => self.shorthand(),
                Some(ident @ ("true" | "false" | "null")) => {
                    let value = match ident {
                        "true" => serde_json::Value::Bool(true),
                        "false" => serde_json::Value::Bool(false),
                        _ => serde_json::Value::Null,
                    };
                    self.pos += ident.len();
                    Ok(Value::Scalar(Scalar {
                        raw: ident.to_string(),
                        value,
                    }))
                }
                Some(_) => Err(self.unsupported("reference or expression")),
                None => Err(self.syntax(self.found("a value"))),
            },
            None => Err(self.syntax("expected a value".to_string())),
        }
    }

    /// `a: b: 1` is a struct holding a single field and no braces.
    fn shorthand(&mut self) -> Result<Value> {
        let field = self.field()?;
        Ok(Value::Struct(StructLit {
            braced: false,
            decls: vec![Decl {
                leading: String::new(),
                kind: DeclKind::Field(field),
            }],
            closing: String::new(),
        }))
    }

    fn list(&mut self) -> Result<Value> {
        let mut elems = Vec::new();
        loop {
            let leading = self.trivia();
            match self.peek() {
                Some(']') => {
                    self.bump();
                    return Ok(Value::List(ListLit {
                        elems,
                        closing: leading,
                    }));
                }
                Some('.') => return Err(self.unsupported("list ellipsis")),
                None => return Err(self.syntax("expected ']'".to_string())),
                _ => {
                    let value = self.value()?;
                    elems.push(Element { leading, value });
                }
            }
        }
    }

    fn number(&mut self) -> Result<Value> {
        let start = self.pos;
        let bytes = self.src.as_bytes();
        let mut end = self.pos;
        if bytes.get(end) == Some(&b'-') {
            end += 1;
        }
        while let Some(&b) = bytes.get(end) {
            let sign_after_exponent = (b == b'+' || b == b'-')
                && end > start
                && matches!(bytes[end - 1], b'e' | b'E');
            if b.is_ascii_digit() || b == b'.' || b == b'e' || b == b'E' || sign_after_exponent {
                end += 1;
            } else {
                break;
            }
        }
        if let Some(&b) = bytes.get(end) {
            if b.is_ascii_alphabetic() || b == b'_' {
                return Err(self.unsupported("number literal with suffix or separator"));
            }
        }
        let raw = &self.src[start..end];
        match Scalar::number(raw) {
            Some(scalar) => {
                self.pos = end;
                Ok(Value::Scalar(scalar))
            }
            None => Err(self.syntax(format!("invalid number {raw:?}"))),
        }
    }

    fn attribute(&mut self) -> Result<Attribute> {
        self.bump(); // '@'
        let name = match self.identifier() {
            Some(name) => name.to_string(),
            None => return Err(self.syntax("expected attribute name".to_string())),
        };
        if self.peek() != Some('(') {
            return Err(self.syntax(format!("expected '(' after @{name}")));
        }
        self.bump();
        let start = self.pos;
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        while let Some(c) = self.peek() {
            if in_string {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    '\n' => break,
                    _ => {}
                }
            } else {
                match c {
                    '"' => in_string = true,
                    '(' => depth += 1,
                    ')' if depth == 0 => {
                        let body = self.src[start..self.pos].to_string();
                        self.bump();
                        return Ok(Attribute { name, body });
                    }
                    ')' => depth -= 1,
                    '\n' => break,
                    _ => {}
                }
            }
            self.bump();
        }
        Err(self.syntax(format!("unterminated attribute @{name}")))
    }

    /// Parse a double-quoted string at the cursor and return its decoded contents.
    fn string(&mut self) -> Result<String> {
        if self.src[self.pos..].starts_with("\"\"\"") {
            return Err(self.unsupported("multi-line string"));
        }
        self.bump(); // opening quote
        let mut out = String::new();
        loop {
            let c = match self.peek() {
                Some('\n') | None => return Err(self.syntax("unterminated string".to_string())),
                Some(c) => c,
            };
            self.bump();
            match c {
                '"' => return Ok(out),
                '\\' => out.push(self.escape()?),
                c => out.push(c),
            }
        }
    }

    fn escape(&mut self) -> Result<char> {
        let Some(c) = self.peek() else {
            return Err(self.syntax("unterminated escape".to_string()));
        };
        self.bump();
        let decoded = match c {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'b' => '\u{8}',
            'f' => '\u{c}',
            '\\' => '\\',
            '"' => '"',
            '/' => '/',
            'u' => return self.unicode(4),
            'U' => return self.unicode(8),
            other => return Err(self.syntax(format!("invalid escape '\\{other}'"))),
        };
        Ok(decoded)
    }

    fn unicode(&mut self, digits: usize) -> Result<char> {
        let hex = self.src.get(self.pos..self.pos + digits).unwrap_or("");
        let code = u32::from_str_radix(hex, 16)
            .ok()
            .filter(|_| hex.len() == digits)
            .and_then(char::from_u32);
        match code {
            Some(c) => {
                self.pos += digits;
                Ok(c)
            }
            None => Err(self.syntax("invalid unicode escape".to_string())),
        }
    }

    /// Byte length of the string literal at the cursor, without consuming it.
    fn string_len(&mut self) -> Result<usize> {
        let start = self.pos;
        let result = self.string();
        let len = self.pos - start;
        self.pos = start;
        result.map(|_| len)
    }

    /// Whitespace, newlines, `//` comments and separating commas.
    fn trivia(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == ',' {
                self.bump();
            } else if self.src[self.pos..].starts_with("//") {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else {
                break;
            }
        }
        self.src[start..self.pos].to_string()
    }

    /// Spaces and tabs on the current line.
    fn inline_ws(&mut self) -> &'a str {
        let src = self.src;
        let start = self.pos;
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.bump();
        }
        &src[start..self.pos]
    }

    fn identifier(&mut self) -> Option<&'a str> {
        let ident = self.peek_identifier()?;
        self.pos += ident.len();
        Some(ident)
    }

    fn peek_identifier(&self) -> Option<&'a str> {
        let src = self.src;
        let rest = &src[self.pos..];
        let mut end = 0;
        for (i, c) in rest.char_indices() {
            let valid = if i == 0 {
                c.is_ascii_alphabetic() || c == '_' || c == '$'
            } else {
                c.is_ascii_alphanumeric() || c == '_' || c == '$'
            };
            if !valid {
                break;
            }
            end = i + c.len_utf8();
        }
        (end > 0).then(|| &rest[..end])
    }

    /// Whether the token of `len` bytes at the cursor is followed by a colon.
    fn followed_by_colon(&self, len: usize) -> bool {
        self.src[self.pos + len..]
            .trim_start_matches([' ', '\t'])
            .starts_with(':')
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn line_col(&self) -> (usize, usize) {
        let before = &self.src[..self.pos];
        let line = before.matches('\n').count() + 1;
        let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        (line, column)
    }

    fn found(&self, expected: &str) -> String {
        match self.peek() {
            Some(c) => format!("expected {expected}, found {c:?}"),
            None => format!("expected {expected}, found end of input"),
        }
    }

    fn syntax(&self, message: String) -> ParseError {
        let (line, column) = self.line_col();
        ParseError::Syntax {
            line,
            column,
            message,
        }
    }

    fn unsupported(&self, what: &'static str) -> ParseError {
        let (line, column) = self.line_col();
        ParseError::Unsupported { line, column, what }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{fields, Document, Value};
    use super::Parser;
    use crate::error::{Error, ParseError};

    fn parse(src: &str) -> Document {
        Document::parse(src).unwrap()
    }

    fn parse_err(src: &str) -> ParseError {
        match Document::parse(src) {
            Err(Error::Parse(e)) => e,
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_render_is_lossless() {
        let sources = [
            "",
            "a: 1\n",
            "package config\n\n// header comment\na: 1 // trailing\nb: \"x\" @secret()\n",
            "db: {\n\thost: \"localhost\"\n\tport: 5432\n\n\t// creds\n\tpassword: \"hunter2\" @secret(sops)\n}\n",
            "inline: {a: 1, b: [1, 2, {c: true}], d: null}\n",
            "a: b: c: \"deep\" @secret()\n",
            "\"quoted-label\": -1.5e3\nlast: false",
            "@extern(go)\nx: [ ]\ny: {}\n// end\n",
        ];
        for src in sources {
            assert_eq!(parse(src).render(), src, "roundtrip of {:?}", src);
        }
    }

    #[test]
    fn test_field_attributes() {
        let doc = parse("b: \"x\" @secret() @go(B)\n");
        let field = doc.field("b").unwrap();
        assert_eq!(field.attrs.len(), 2);
        assert_eq!(field.attrs[0].attr.name, "secret");
        assert_eq!(field.attrs[0].attr.body, "");
        assert_eq!(field.attrs[1].attr.name, "go");
        assert_eq!(field.attrs[1].attr.body, "B");
    }

    #[test]
    fn test_attribute_body_with_parens_and_strings() {
        let doc = parse("a: 1 @doc(\"has ) paren\", (nested))\n");
        let field = doc.field("a").unwrap();
        assert_eq!(field.attrs[0].attr.body, "\"has ) paren\", (nested)");
    }

    #[test]
    fn test_shorthand_nesting() {
        let doc = parse("a: b: 1\n");
        let field = doc.field("a").unwrap();
        let Value::Struct(s) = &field.value else {
            panic!("expected struct");
        };
        assert!(!s.braced);
        let inner: Vec<_> = fields(&s.decls).map(|f| f.label.name.as_str()).collect();
        assert_eq!(inner, ["b"]);
        assert_eq!(doc.to_json(), serde_json::json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_string_escapes() {
        let doc = parse(r#"s: "tab\tquote\"slash\/é\U0001F600""#);
        assert_eq!(
            doc.to_json()["s"],
            serde_json::json!("tab\tquote\"slash/\u{e9}\u{1F600}")
        );
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(Parser::new(r#""a\/b\u0041""#).string_literal().unwrap(), "a/bA");
        assert!(Parser::new(r#""a" "b""#).string_literal().is_err());
        assert!(Parser::new("42").string_literal().is_err());
    }

    #[test]
    fn test_quoted_label_is_decoded() {
        let doc = parse("\"a-b\": 1\n");
        let field = doc.field("a-b").unwrap();
        assert_eq!(field.label.raw, "\"a-b\"");
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let err = parse_err("a: 1\nb: 2\na: 3\n");
        assert_eq!(
            err,
            ParseError::DuplicateLabel {
                label: "a".to_string(),
                line: 3
            }
        );
    }

    #[test]
    fn test_duplicate_label_in_nested_struct_rejected() {
        let err = parse_err("x: {a: 1, a: 2}\n");
        assert!(matches!(err, ParseError::DuplicateLabel { .. }));
    }

    #[test]
    fn test_unsupported_constructs() {
        assert!(matches!(
            parse_err("a: b\n"),
            ParseError::Unsupported { .. }
        ));
        assert!(matches!(
            parse_err("a?: 1\n"),
            ParseError::Unsupported { .. }
        ));
        assert!(matches!(
            parse_err("import \"strings\"\n"),
            ParseError::Unsupported { .. }
        ));
        assert!(matches!(
            parse_err("a: \"\"\"\n\tx\n\t\"\"\"\n"),
            ParseError::Unsupported { .. }
        ));
        assert!(matches!(
            parse_err("a: 1_000\n"),
            ParseError::Unsupported { .. }
        ));
        assert!(matches!(
            parse_err("#Def: {}\n"),
            ParseError::Unsupported { .. }
        ));
    }

    #[test]
    fn test_syntax_errors_report_position() {
        let err = parse_err("a: 1\nb: {\n");
        assert!(matches!(err, ParseError::Syntax { line: 3, .. }));

        let err = parse_err("a: \"open\n");
        assert!(matches!(err, ParseError::Syntax { line: 1, .. }));

        let err = parse_err("a 1\n");
        assert!(matches!(err, ParseError::Syntax { line: 1, column: 3, .. }));
    }

    #[test]
    fn test_package_only_first() {
        parse("package foo\na: 1\n");
        assert!(matches!(
            parse_err("a: 1\npackage foo\n"),
            ParseError::Syntax { .. }
        ));
    }

    #[test]
    fn test_keyword_labels() {
        let doc = parse("package: 1\nimport: 2\n");
        assert_eq!(doc.to_json(), serde_json::json!({"package": 1, "import": 2}));
    }
}
