//! Go declaration parser.
//!
//! Reads the top-level declarations of one file into a [`SourceFile`].
//! Only declarations are parsed; function bodies and `var`/`const`
//! initializers are skipped by balancing delimiters.

use super::lexer::{tokenize, Token, TokenKind};
use super::tag::unquote;
use super::*;
use crate::core::error::{GoopError, GoopResult, ModelError, ParseError};

/// Parse one Go source file.
pub fn parse_source(file_name: &str, text: &str) -> GoopResult<SourceFile> {
    let tokens = tokenize(file_name, text)?;
    Parser::new(file_name, tokens).parse()
}

struct Parser<'f, 'src> {
    file: &'f str,
    tokens: Vec<Token<'src>>,
    pos: usize,
    /// Declaration being parsed, for error reports.
    current_decl: String,
}

/// One entry of a parameter list before Go's grouping rules are applied.
enum ParamEntry<'src> {
    /// A lone identifier: a parameter name or a type name, decided later.
    Lone(&'src str),
    Named(&'src str, TypeExpr),
    Type(TypeExpr),
}

impl<'f, 'src> Parser<'f, 'src> {
    fn new(file: &'f str, tokens: Vec<Token<'src>>) -> Self {
        Self {
            file,
            tokens,
            pos: 0,
            current_decl: String::new(),
        }
    }

    fn parse(mut self) -> GoopResult<SourceFile> {
        self.skip_trivia();
        if !self.peek().is_ident("package") {
            return Err(self.syntax_error("expected package clause"));
        }
        self.bump();
        let package_name = self.expect_ident()?.to_string();

        let mut file = SourceFile {
            file_name: self.file.to_string(),
            package_name,
            imports: Vec::new(),
            types: Vec::new(),
            functions: Vec::new(),
        };

        let mut doc: Vec<&'src str> = Vec::new();
        let mut at_line_start = false;
        loop {
            let tok = self.peek();
            match tok.kind {
                TokenKind::Eof => break,
                TokenKind::Comment => {
                    if at_line_start {
                        doc.push(tok.text);
                    }
                    self.bump();
                }
                TokenKind::Newline => {
                    self.bump();
                    at_line_start = true;
                    // A blank line detaches the comments above it.
                    if self.peek().kind == TokenKind::Newline {
                        doc.clear();
                    }
                }
                TokenKind::Punct if tok.text == ";" => {
                    self.bump();
                }
                TokenKind::Ident => {
                    let decl_doc = doc_text(&doc);
                    doc.clear();
                    at_line_start = false;
                    self.bump();
                    match tok.text {
                        "import" => self.parse_import_decl(&mut file.imports)?,
                        "type" => file.types.extend(self.parse_type_decl(decl_doc)?),
                        "func" => file.functions.push(self.parse_func_decl(decl_doc, tok.line)?),
                        "var" | "const" => self.skip_value_decl()?,
                        other => {
                            return Err(self.error_at(tok, format!("unexpected `{}` at top level", other)))
                        }
                    }
                }
                _ => return Err(self.error_at(tok, format!("unexpected `{}` at top level", tok.text))),
            }
        }

        log::trace!(
            "parsed {}: {} imports, {} types, {} functions",
            file.file_name,
            file.imports.len(),
            file.types.len(),
            file.functions.len()
        );
        Ok(file)
    }

    // ---------------------------------------------------------------------
    // Token access
    // ---------------------------------------------------------------------

    fn peek(&self) -> Token<'src> {
        self.tokens[self.pos]
    }

    fn bump(&mut self) -> Token<'src> {
        let tok = self.tokens[self.pos];
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }

    /// The `n`-th token from the current one, ignoring comments and newlines.
    fn lookahead(&self, n: usize) -> Token<'src> {
        let mut seen = 0;
        for tok in &self.tokens[self.pos..] {
            if matches!(tok.kind, TokenKind::Comment | TokenKind::Newline) {
                continue;
            }
            if seen == n || tok.kind == TokenKind::Eof {
                return *tok;
            }
            seen += 1;
        }
        self.tokens[self.tokens.len() - 1]
    }

    fn skip_comments(&mut self) {
        while self.peek().kind == TokenKind::Comment {
            self.bump();
        }
    }

    fn skip_trivia(&mut self) {
        while matches!(self.peek().kind, TokenKind::Comment | TokenKind::Newline) {
            self.bump();
        }
    }

    fn eat_punct(&mut self, p: &str) -> bool {
        self.skip_comments();
        if self.peek().is_punct(p) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, p: &str) -> GoopResult<()> {
        if !self.eat_punct(p) {
            return Err(self.syntax_error(format!("expected `{}`, found {}", p, describe(self.peek()))));
        }
        Ok(())
    }

    fn expect_ident(&mut self) -> GoopResult<&'src str> {
        self.skip_comments();
        let tok = self.peek();
        if tok.kind != TokenKind::Ident {
            return Err(self.syntax_error(format!("expected identifier, found {}", describe(tok))));
        }
        self.bump();
        Ok(tok.text)
    }

    /// Skip a delimited group starting at the current token.
    fn skip_balanced(&mut self, open: &str, close: &str) -> GoopResult<()> {
        self.skip_comments();
        let start = self.peek();
        if !start.is_punct(open) {
            return Err(self.syntax_error(format!("expected `{}`, found {}", open, describe(start))));
        }

        let mut depth = 0usize;
        loop {
            let tok = self.bump();
            match tok.kind {
                TokenKind::Eof => return Err(self.error_at(start, format!("unbalanced `{}`", open))),
                TokenKind::Punct if tok.text == open => depth += 1,
                TokenKind::Punct if tok.text == close => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }

    /// Skip to the end of the current statement: a newline or `;` outside any
    /// brackets, or a `)` closing an enclosing group (left unconsumed).
    fn skip_statement(&mut self) -> GoopResult<()> {
        let start = self.peek();
        let mut depth = 0usize;
        loop {
            let tok = self.peek();
            match tok.kind {
                TokenKind::Eof => {
                    if depth > 0 {
                        return Err(self.error_at(start, "unbalanced brackets"));
                    }
                    return Ok(());
                }
                TokenKind::Newline if depth == 0 => return Ok(()),
                TokenKind::Punct => match tok.text {
                    ";" if depth == 0 => return Ok(()),
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => {
                        if depth == 0 {
                            return Ok(());
                        }
                        depth -= 1;
                    }
                    _ => {}
                },
                _ => {}
            }
            self.bump();
        }
    }

    // ---------------------------------------------------------------------
    // Declarations
    // ---------------------------------------------------------------------

    fn parse_import_decl(&mut self, imports: &mut Vec<ImportSpec>) -> GoopResult<()> {
        if self.eat_punct("(") {
            loop {
                self.skip_trivia();
                if self.eat_punct(")") {
                    break;
                }
                if self.eat_punct(";") {
                    continue;
                }
                imports.push(self.parse_import_spec()?);
            }
        } else {
            imports.push(self.parse_import_spec()?);
        }
        Ok(())
    }

    fn parse_import_spec(&mut self) -> GoopResult<ImportSpec> {
        self.skip_comments();
        let mut alias = None;
        let tok = self.peek();
        if tok.kind == TokenKind::Ident || tok.is_punct(".") {
            alias = Some(tok.text.to_string());
            self.bump();
            self.skip_comments();
        }

        let path_tok = self.peek();
        let path = match path_tok.kind {
            TokenKind::String => unquote(path_tok.text),
            TokenKind::RawString => Some(path_tok.text.trim_matches('`').to_string()),
            _ => None,
        };
        let path = path.ok_or_else(|| self.syntax_error(format!("expected import path, found {}", describe(path_tok))))?;
        self.bump();
        Ok(ImportSpec { alias, path })
    }

    fn parse_type_decl(&mut self, doc: Option<String>) -> GoopResult<Option<TypeDecl>> {
        if !self.eat_punct("(") {
            return self.parse_type_spec(doc).map(Some);
        }

        let mut specs = Vec::new();
        loop {
            self.skip_trivia();
            if self.eat_punct(")") {
                break;
            }
            if self.eat_punct(";") {
                continue;
            }
            specs.push(self.parse_type_spec(None)?);
        }

        if specs.len() > 1 {
            let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
            return Err(ModelError::AmbiguousDeclaration {
                name: names.join(", "),
                reason: format!("expected one type spec per declaration, found {}", specs.len()),
            }
            .into());
        }

        Ok(specs.pop().map(|mut spec| {
            spec.doc = spec.doc.or(doc);
            spec
        }))
    }

    fn parse_type_spec(&mut self, doc: Option<String>) -> GoopResult<TypeDecl> {
        self.skip_comments();
        let line = self.peek().line;
        let name = self.expect_ident()?;
        self.current_decl = name.to_string();

        let mut generic = false;
        if self.peek().is_punct("[") && self.looks_like_type_params() {
            log::warn!("type parameters of {} are not supported", name);
            generic = true;
            self.skip_balanced("[", "]")?;
        }

        let is_alias = self.eat_punct("=");
        self.skip_comments();
        let tok = self.peek();
        let kind = if tok.is_ident("struct") && !is_alias {
            self.bump();
            TypeDeclKind::Struct(self.parse_struct_body()?)
        } else if tok.is_ident("interface") && !is_alias {
            self.bump();
            self.skip_balanced("{", "}")?;
            TypeDeclKind::Interface
        } else {
            self.skip_statement()?;
            TypeDeclKind::Other
        };

        Ok(TypeDecl {
            name: name.to_string(),
            doc,
            generic,
            kind,
            line,
        })
    }

    /// At `[` after a type name: `[T any]` opens type parameters, `[4]int` is an array.
    fn looks_like_type_params(&self) -> bool {
        let first = self.lookahead(1);
        let second = self.lookahead(2);
        first.kind == TokenKind::Ident
            && (second.kind == TokenKind::Ident || second.is_punct(",") || second.is_punct("~"))
    }

    fn parse_struct_body(&mut self) -> GoopResult<Vec<FieldDecl>> {
        self.expect_punct("{")?;
        let mut fields = Vec::new();
        loop {
            self.skip_trivia();
            if self.eat_punct("}") {
                break;
            }
            if self.eat_punct(";") {
                continue;
            }
            fields.extend(self.parse_field()?);

            self.skip_comments();
            let tok = self.peek();
            if !(tok.kind == TokenKind::Newline || tok.is_punct(";") || tok.is_punct("}")) {
                return Err(self.syntax_error(format!("expected end of field, found {}", describe(tok))));
            }
        }
        Ok(fields)
    }

    fn parse_field(&mut self) -> GoopResult<Vec<FieldDecl>> {
        let first = self.peek();

        // Embedded *T or *pkg.T.
        if first.is_punct("*") {
            let ty = self.parse_type()?;
            let tag = self.parse_tag()?;
            return Ok(vec![FieldDecl { name: None, ty, tag }]);
        }

        let name = self.expect_ident()?;
        self.skip_comments();
        let next = self.peek();

        if next.is_punct(".") {
            self.bump();
            let selector = self.expect_ident()?;
            let ty = TypeExpr::Named {
                package: Some(name.to_string()),
                name: selector.to_string(),
            };
            if self.peek().is_punct("[") {
                return Err(self.unsupported(format!("embedded generic type {}[...] is not supported", ty)));
            }
            let tag = self.parse_tag()?;
            return Ok(vec![FieldDecl { name: None, ty, tag }]);
        }

        // `List[int]` embeds an instantiation; `buf [4]byte` is an array field.
        if next.is_punct("[") && self.brackets_end_field() {
            return Err(self.unsupported(format!("embedded generic type {}[...] is not supported", name)));
        }

        if next.kind == TokenKind::Newline
            || next.kind == TokenKind::String
            || next.kind == TokenKind::RawString
            || next.is_punct(";")
            || next.is_punct("}")
        {
            let tag = self.parse_tag()?;
            return Ok(vec![FieldDecl {
                name: None,
                ty: TypeExpr::named(name),
                tag,
            }]);
        }

        let mut names = vec![name];
        while self.eat_punct(",") {
            self.skip_trivia();
            names.push(self.expect_ident()?);
        }
        let ty = self.parse_type()?;
        let tag = self.parse_tag()?;

        Ok(names
            .into_iter()
            .map(|name| FieldDecl {
                name: Some(name.to_string()),
                ty: ty.clone(),
                tag: tag.clone(),
            })
            .collect())
    }

    /// Whether the bracket group at the current token is the last thing of its
    /// field (followed by a tag or the end of the field).
    fn brackets_end_field(&self) -> bool {
        let mut depth = 0usize;
        let mut rest = self.tokens[self.pos..].iter();
        for tok in rest.by_ref() {
            match tok.kind {
                TokenKind::Eof => return false,
                TokenKind::Punct if tok.text == "[" => depth += 1,
                TokenKind::Punct if tok.text == "]" => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
        match rest.find(|tok| tok.kind != TokenKind::Comment) {
            Some(tok) => {
                matches!(tok.kind, TokenKind::Newline | TokenKind::String | TokenKind::RawString | TokenKind::Eof)
                    || tok.is_punct(";")
                    || tok.is_punct("}")
            }
            None => false,
        }
    }

    fn parse_tag(&mut self) -> GoopResult<Option<StructTag>> {
        self.skip_comments();
        let tok = self.peek();
        let raw = match tok.kind {
            TokenKind::RawString => tok.text.trim_matches('`').to_string(),
            TokenKind::String => unquote(tok.text)
                .ok_or_else(|| self.syntax_error(format!("malformed tag {}", tok.text)))?,
            _ => return Ok(None),
        };
        self.bump();
        Ok(Some(StructTag::new(raw)))
    }

    fn parse_func_decl(&mut self, doc: Option<String>, line: usize) -> GoopResult<FunctionDecl> {
        self.skip_comments();
        let receiver = if self.peek().is_punct("(") {
            Some(self.parse_receiver()?)
        } else {
            None
        };

        let name = self.expect_ident()?;
        self.current_decl = match &receiver {
            Some(recv) => format!("{}.{}", recv.type_name, name),
            None => name.to_string(),
        };

        self.skip_comments();
        if self.peek().is_punct("[") {
            log::warn!("type parameters of function {} are not supported", self.current_decl);
            self.skip_balanced("[", "]")?;
        }

        let signature = self.parse_signature()?;

        self.skip_comments();
        if self.peek().is_punct("{") {
            self.skip_balanced("{", "}")?;
        }

        Ok(FunctionDecl {
            name: name.to_string(),
            doc,
            receiver,
            signature,
            line,
        })
    }

    fn parse_receiver(&mut self) -> GoopResult<Receiver> {
        self.expect_punct("(")?;
        self.skip_trivia();

        let mut name = None;
        let first = self.peek();
        if first.kind == TokenKind::Ident {
            let next = self.lookahead(1);
            if next.kind == TokenKind::Ident || next.is_punct("*") {
                name = Some(first.text.to_string());
                self.bump();
            }
        }

        self.skip_trivia();
        let is_pointer = self.eat_punct("*");
        self.skip_trivia();
        let type_name = self.expect_ident()?.to_string();

        self.skip_trivia();
        if self.peek().is_punct("[") {
            self.skip_balanced("[", "]")?;
            self.skip_trivia();
        }
        if self.peek().is_punct(",") {
            return Err(self.syntax_error(format!("method on {} has multiple receivers", type_name)));
        }
        self.expect_punct(")")?;

        Ok(Receiver {
            name,
            type_name,
            is_pointer,
        })
    }

    // ---------------------------------------------------------------------
    // Signatures and types
    // ---------------------------------------------------------------------

    fn parse_signature(&mut self) -> GoopResult<Signature> {
        let params = self.parse_param_list()?;
        let results = self.parse_results()?;
        Ok(Signature::new(params, results))
    }

    fn parse_results(&mut self) -> GoopResult<Vec<Param>> {
        self.skip_comments();
        let tok = self.peek();
        if tok.is_punct("(") {
            return self.parse_param_list();
        }
        if starts_type(tok) {
            let ty = self.parse_type()?;
            return Ok(vec![Param { name: None, ty }]);
        }
        Ok(Vec::new())
    }

    fn parse_param_list(&mut self) -> GoopResult<Vec<Param>> {
        self.expect_punct("(")?;

        let mut entries = Vec::new();
        loop {
            self.skip_trivia();
            if self.eat_punct(")") {
                break;
            }
            entries.push(self.parse_param_entry()?);
            self.skip_trivia();
            if self.eat_punct(",") {
                continue;
            }
            self.expect_punct(")")?;
            break;
        }

        let any_named = entries.iter().any(|e| matches!(e, ParamEntry::Named(..)));
        if !any_named {
            return Ok(entries
                .into_iter()
                .map(|entry| match entry {
                    ParamEntry::Lone(ty) => Param::new(None, TypeExpr::named(ty)),
                    ParamEntry::Type(ty) | ParamEntry::Named(_, ty) => Param::new(None, ty),
                })
                .collect());
        }

        // `a, b int, c string`: lone names take the type of the next named entry.
        let mut params = Vec::new();
        let mut pending: Vec<&str> = Vec::new();
        for entry in entries {
            match entry {
                ParamEntry::Lone(name) => pending.push(name),
                ParamEntry::Named(name, ty) => {
                    for pending_name in pending.drain(..) {
                        params.push(Param::new(Some(pending_name), ty.clone()));
                    }
                    params.push(Param::new(Some(name), ty));
                }
                ParamEntry::Type(_) => {
                    return Err(self.syntax_error("mixed named and unnamed parameters"));
                }
            }
        }
        if !pending.is_empty() {
            return Err(self.syntax_error(format!("missing type for parameter {}", pending.join(", "))));
        }
        Ok(params)
    }

    fn parse_param_entry(&mut self) -> GoopResult<ParamEntry<'src>> {
        let tok = self.peek();
        if tok.kind == TokenKind::Ident && !is_type_keyword(tok.text) {
            let next = self.lookahead(1);
            if next.is_punct(",") || next.is_punct(")") {
                self.bump();
                return Ok(ParamEntry::Lone(tok.text));
            }
            if next.is_punct(".") {
                return Ok(ParamEntry::Type(self.parse_type()?));
            }
            self.bump();
            return Ok(ParamEntry::Named(tok.text, self.parse_param_type()?));
        }
        Ok(ParamEntry::Type(self.parse_param_type()?))
    }

    fn parse_param_type(&mut self) -> GoopResult<TypeExpr> {
        if self.eat_punct("...") {
            return Ok(TypeExpr::Variadic(Box::new(self.parse_type()?)));
        }
        self.parse_type()
    }

    fn parse_type(&mut self) -> GoopResult<TypeExpr> {
        self.skip_comments();
        let tok = self.peek();
        match tok.kind {
            TokenKind::Punct => match tok.text {
                "*" => {
                    self.bump();
                    Ok(TypeExpr::Pointer(Box::new(self.parse_type()?)))
                }
                "[" => {
                    self.bump();
                    if self.eat_punct("]") {
                        return Ok(TypeExpr::Slice(Box::new(self.parse_type()?)));
                    }
                    let mut len = String::new();
                    loop {
                        self.skip_comments();
                        let part = self.bump();
                        match part.kind {
                            TokenKind::Punct if part.text == "]" => break,
                            TokenKind::Eof | TokenKind::Newline => {
                                return Err(self.error_at(part, "unterminated array length"))
                            }
                            _ => len.push_str(part.text),
                        }
                    }
                    Ok(TypeExpr::Array(len, Box::new(self.parse_type()?)))
                }
                "(" => {
                    self.bump();
                    let ty = self.parse_type()?;
                    self.expect_punct(")")?;
                    Ok(ty)
                }
                "<" => Err(self.unsupported("channel types are not supported")),
                _ => Err(self.syntax_error(format!("expected type, found {}", describe(tok)))),
            },
            TokenKind::Ident => match tok.text {
                "map" => {
                    self.bump();
                    self.expect_punct("[")?;
                    let key = self.parse_type()?;
                    self.expect_punct("]")?;
                    let value = self.parse_type()?;
                    Ok(TypeExpr::Map(Box::new(key), Box::new(value)))
                }
                "func" => {
                    self.bump();
                    Ok(TypeExpr::Func(Box::new(self.parse_signature()?)))
                }
                "chan" => Err(self.unsupported("channel types are not supported")),
                "interface" | "struct" => {
                    self.bump();
                    self.expect_punct("{")?;
                    self.skip_trivia();
                    if !self.eat_punct("}") {
                        return Err(self.unsupported(format!("inline {} types are not supported", tok.text)));
                    }
                    Ok(if tok.text == "interface" {
                        TypeExpr::EmptyInterface
                    } else {
                        TypeExpr::EmptyStruct
                    })
                }
                _ => {
                    self.bump();
                    let ty = if self.peek().is_punct(".") {
                        self.bump();
                        let name = self.expect_ident()?;
                        TypeExpr::Named {
                            package: Some(tok.text.to_string()),
                            name: name.to_string(),
                        }
                    } else {
                        TypeExpr::named(tok.text)
                    };
                    if self.peek().is_punct("[") {
                        return Err(self.unsupported(format!("generic type {}[...] is not supported", ty)));
                    }
                    Ok(ty)
                }
            },
            _ => Err(self.syntax_error(format!("expected type, found {}", describe(tok)))),
        }
    }

    // ---------------------------------------------------------------------
    // Errors
    // ---------------------------------------------------------------------

    fn error_at(&self, tok: Token<'_>, message: impl Into<String>) -> GoopError {
        ParseError {
            file: self.file.to_string(),
            line: tok.line,
            column: tok.column,
            message: message.into(),
        }
        .into()
    }

    fn syntax_error(&self, message: impl Into<String>) -> GoopError {
        self.error_at(self.peek(), message)
    }

    fn unsupported(&self, reason: impl Into<String>) -> GoopError {
        ModelError::AmbiguousDeclaration {
            name: self.current_decl.clone(),
            reason: reason.into(),
        }
        .into()
    }

    fn skip_value_decl(&mut self) -> GoopResult<()> {
        self.skip_comments();
        if self.peek().is_punct("(") {
            self.skip_balanced("(", ")")
        } else {
            self.skip_statement()
        }
    }
}

fn is_type_keyword(word: &str) -> bool {
    matches!(word, "map" | "func" | "chan" | "interface" | "struct")
}

/// Whether a token can begin a type expression (used for unparenthesized results).
fn starts_type(tok: Token<'_>) -> bool {
    match tok.kind {
        TokenKind::Ident => true,
        TokenKind::Punct => matches!(tok.text, "*" | "[" | "<"),
        _ => false,
    }
}

fn describe(tok: Token<'_>) -> String {
    match tok.kind {
        TokenKind::Eof => "end of file".to_string(),
        TokenKind::Newline => "newline".to_string(),
        _ => format!("`{}`", tok.text),
    }
}

/// Documentation text of the comment group above a declaration.
fn doc_text(comments: &[&str]) -> Option<String> {
    let mut lines = Vec::new();
    for comment in comments {
        if let Some(rest) = comment.strip_prefix("//") {
            // Compiler directives are not documentation.
            if rest.starts_with("go:") || rest.starts_with("line ") {
                continue;
            }
            lines.push(rest.strip_prefix(' ').unwrap_or(rest).trim_end().to_string());
        } else if let Some(body) = comment.strip_prefix("/*").and_then(|c| c.strip_suffix("*/")) {
            lines.extend(body.lines().map(|l| l.trim().to_string()));
        }
    }
    let text = lines.join("\n").trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
