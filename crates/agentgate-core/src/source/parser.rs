//! Structural parser: tokens to [`SourceModel`].
//!
//! This is not a grammar. It balances delimiters, then walks each scope as a
//! sequence of items (`head ;`, `head { body }` or `head => expr ;`) and
//! classifies each head as an import, namespace, type, member or something
//! it does not care about.

use std::ops::Range;

use super::error::ParseError;
use super::lexer::{tokenize, Token, TokenKind};
use super::model::{
    Import, MethodDecl, Param, SourceModel, Span, StatementKind, StringLiteral, TypeDecl, TypeKind,
};

const MODIFIERS: &[&str] = &[
    "public",
    "private",
    "protected",
    "internal",
    "static",
    "abstract",
    "sealed",
    "virtual",
    "override",
    "readonly",
    "async",
    "partial",
    "export",
    "default",
    "final",
    "const",
    "extern",
    "unsafe",
    "new",
    "volatile",
    "declare",
    "open",
    "data",
    "inline",
    "suspend",
    "synchronized",
    "native",
    "transient",
    "strictfp",
    "global",
];

/// Names that look like calls rather than declarations.
const NON_DECLARATION_NAMES: &[&str] = &[
    "if", "while", "for", "foreach", "switch", "catch", "using", "lock", "return", "new", "typeof",
    "sizeof", "nameof", "fixed", "checked", "unchecked", "await", "throw", "yield", "when", "base",
    "this", "super", "function", "fun",
];

const PARAM_MODIFIERS: &[&str] = &[
    "this", "ref", "out", "in", "params", "readonly", "final", "public", "private", "protected",
    "val", "var", "vararg", "scoped",
];

/// Parse a candidate's source text.
pub fn parse_source(file_name: &str, text: &str) -> Result<SourceModel, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let tokens = tokenize(text)?;
    let matching = match_delimiters(&tokens)?;

    let mut parser = Parser {
        tokens: &tokens,
        matching: &matching,
        namespace: None,
        imports: Vec::new(),
        import_ranges: Vec::new(),
        types: Vec::new(),
        functions: Vec::new(),
    };
    parser.parse_scope(0, tokens.len(), None);

    let literals = tokens
        .iter()
        .enumerate()
        .filter(|(i, t)| {
            t.kind == TokenKind::Str && !parser.import_ranges.iter().any(|r| r.contains(i))
        })
        .map(|(_, t)| StringLiteral {
            value: t.text.clone(),
            line: t.line,
        })
        .collect();

    Ok(SourceModel {
        file_name: file_name.to_string(),
        namespace: parser.namespace,
        imports: parser.imports,
        types: parser.types,
        functions: parser.functions,
        literals,
        line_count: text.lines().count() as u32,
    })
}

fn closer_for(open: &str) -> Option<char> {
    match open {
        "{" => Some('}'),
        "(" => Some(')'),
        "[" => Some(']'),
        _ => None,
    }
}

fn opener_for(close: &str) -> Option<char> {
    match close {
        "}" => Some('{'),
        ")" => Some('('),
        "]" => Some('['),
        _ => None,
    }
}

/// Index of the partner of every `{}`/`()`/`[]` token.
fn match_delimiters(tokens: &[Token]) -> Result<Vec<Option<usize>>, ParseError> {
    let mut matching = vec![None; tokens.len()];
    let mut stack: Vec<(usize, char)> = Vec::new();

    for (i, tok) in tokens.iter().enumerate() {
        if tok.kind != TokenKind::Punct {
            continue;
        }
        if let Some(close) = closer_for(&tok.text) {
            stack.push((i, close));
        } else if opener_for(&tok.text).is_some() {
            let found = tok.text.chars().next().unwrap_or(' ');
            match stack.pop() {
                None => {
                    return Err(ParseError::UnexpectedCloser {
                        found,
                        line: tok.line,
                    })
                }
                Some((_, expected)) if expected != found => {
                    return Err(ParseError::Mismatched {
                        expected,
                        found,
                        line: tok.line,
                    })
                }
                Some((open, _)) => {
                    matching[open] = Some(i);
                    matching[i] = Some(open);
                }
            }
        }
    }

    match stack.pop() {
        Some((open, _)) => Err(ParseError::Unclosed {
            delimiter: tokens[open].text.chars().next().unwrap_or(' '),
            line: tokens[open].line,
        }),
        None => Ok(matching),
    }
}

enum Body {
    None,
    /// Indices of the `{` and its `}`.
    Block(usize, usize),
    /// Expression tokens after `=>`, excluding the terminating `;`.
    Expr(Range<usize>),
}

struct Item {
    /// First token, including leading attributes.
    start: usize,
    head: Range<usize>,
    body: Body,
    end_line: u32,
    next: usize,
}

struct Parser<'a> {
    tokens: &'a [Token],
    matching: &'a [Option<usize>],
    namespace: Option<String>,
    imports: Vec<Import>,
    import_ranges: Vec<Range<usize>>,
    types: Vec<TypeDecl>,
    functions: Vec<MethodDecl>,
}

impl<'a> Parser<'a> {
    fn tok(&self, i: usize) -> Option<&'a Token> {
        self.tokens.get(i)
    }

    fn partner(&self, i: usize) -> usize {
        self.matching.get(i).copied().flatten().unwrap_or(i)
    }

    fn is_punct(&self, i: usize, p: &str) -> bool {
        self.tok(i).is_some_and(|t| t.is_punct(p))
    }

    /// Walk the items of one scope. `owner` is the index of the enclosing type.
    fn parse_scope(&mut self, start: usize, end: usize, owner: Option<usize>) {
        let mut i = start;
        while i < end {
            let item = self.next_item(i, end);
            i = item.next.max(i + 1);
            self.classify(item, owner);
        }
    }

    fn skip_attributes(&self, mut i: usize, end: usize) -> usize {
        loop {
            if i >= end {
                return i;
            }
            if self.is_punct(i, "[") {
                i = self.partner(i) + 1;
                continue;
            }
            if self.is_punct(i, "@") && self.tok(i + 1).is_some_and(|t| t.kind == TokenKind::Ident)
            {
                i += 2;
                while self.is_punct(i, ".") || self.is_punct(i, ":") {
                    i += 2;
                }
                if self.is_punct(i, "(") {
                    i = self.partner(i) + 1;
                }
                continue;
            }
            return i;
        }
    }

    fn next_item(&self, start: usize, end: usize) -> Item {
        let head_start = self.skip_attributes(start, end);

        if self
            .tok(head_start)
            .is_some_and(|t| t.is_ident("import") || t.is_ident("using"))
        {
            return self.import_item(start, head_start, end);
        }

        let mut in_initializer = false;
        let mut j = head_start;
        while j < end {
            let t = &self.tokens[j];
            if t.kind == TokenKind::Punct {
                match t.text.as_str() {
                    "(" | "[" => {
                        j = self.partner(j) + 1;
                        continue;
                    }
                    ";" => {
                        return Item {
                            start,
                            head: head_start..j,
                            body: Body::None,
                            end_line: t.line,
                            next: j + 1,
                        }
                    }
                    "{" if !in_initializer => {
                        let close = self.partner(j);
                        return Item {
                            start,
                            head: head_start..j,
                            body: Body::Block(j, close),
                            end_line: self.tokens[close].line,
                            next: close + 1,
                        };
                    }
                    "{" => {
                        j = self.partner(j) + 1;
                        continue;
                    }
                    "=>" if !in_initializer => {
                        let semi = self.statement_end(j + 1, end);
                        let end_line = self.tok(semi.min(end.saturating_sub(1))).map_or(t.line, |s| s.line);
                        return Item {
                            start,
                            head: head_start..j,
                            body: Body::Expr(j + 1..semi),
                            end_line,
                            next: semi + 1,
                        };
                    }
                    "=" => in_initializer = true,
                    _ => {}
                }
            }
            j += 1;
        }

        let end_line = self
            .tok(end.saturating_sub(1))
            .map_or(0, |t| t.line);
        Item {
            start,
            head: head_start..end,
            body: Body::None,
            end_line,
            next: end,
        }
    }

    /// Index of the `;` ending the statement that starts at `i`, or `end`.
    fn statement_end(&self, mut i: usize, end: usize) -> usize {
        while i < end {
            let t = &self.tokens[i];
            if t.kind == TokenKind::Punct {
                match t.text.as_str() {
                    "(" | "[" | "{" => {
                        i = self.partner(i) + 1;
                        continue;
                    }
                    ";" => return i,
                    _ => {}
                }
            }
            i += 1;
        }
        end
    }

    /// `import`/`using` items end at `;` or right after the module string.
    fn import_item(&self, start: usize, head_start: usize, end: usize) -> Item {
        let mut j = head_start + 1;
        while j < end {
            let t = &self.tokens[j];
            if t.is_punct(";") {
                break;
            }
            if t.kind == TokenKind::Str {
                j += 1;
                if self.is_punct(j, ";") {
                    break;
                }
                return Item {
                    start,
                    head: head_start..j,
                    body: Body::None,
                    end_line: t.line,
                    next: j,
                };
            }
            if t.is_punct("{") {
                j = self.partner(j) + 1;
                continue;
            }
            j += 1;
        }
        let end_line = self
            .tok(j.min(end.saturating_sub(1)))
            .map_or(0, |t| t.line);
        Item {
            start,
            head: head_start..j,
            body: Body::None,
            end_line,
            next: j + 1,
        }
    }

    fn has_doc(&self, item: &Item) -> bool {
        let last = item.head.start.min(self.tokens.len().saturating_sub(1));
        self.tokens[item.start..=last.max(item.start)]
            .iter()
            .any(|t| t.doc)
    }

    fn classify(&mut self, item: Item, owner: Option<usize>) {
        let tokens = self.tokens;
        let head = item.head.clone();
        if head.is_empty() {
            return;
        }

        if tokens[head.start].is_ident("import") || tokens[head.start].is_ident("using")
        {
            self.record_import(&item);
            return;
        }

        let mut i = head.start;
        let mut modifiers: Vec<&str> = Vec::new();
        while i < head.end {
            let t = &tokens[i];
            if t.kind == TokenKind::Ident && MODIFIERS.contains(&t.text.as_str()) {
                modifiers.push(t.text.as_str());
                i += 1;
            } else {
                break;
            }
        }
        if i >= head.end {
            return;
        }

        let first = &tokens[i];
        if owner.is_none() && (first.is_ident("namespace") || first.is_ident("package")) {
            let name = self.dotted_name(i + 1, head.end);
            if !name.is_empty() {
                self.namespace = Some(name);
            }
            if let Body::Block(open, close) = item.body {
                self.parse_scope(open + 1, close, None);
            }
            return;
        }
        if first.is_ident("delegate") || first.is_ident("typealias") || first.is_ident("type") {
            return;
        }

        if let Some(kind) = TypeKind::from_keyword(&first.text) {
            if first.kind == TokenKind::Ident {
                self.parse_type(&item, kind, i + 1, &modifiers, owner);
                return;
            }
        }

        self.parse_member(&item, i, &modifiers, owner);
    }

    fn record_import(&mut self, item: &Item) {
        self.import_ranges.push(item.start..item.next);
        let head = item.head.clone();
        let line = self.tokens[head.start].line;

        if let Some(s) = self.tokens[head.clone()]
            .iter()
            .find(|t| t.kind == TokenKind::Str)
        {
            self.imports.push(Import {
                path: s.text.clone(),
                line,
            });
            return;
        }

        let mut i = head.start + 1;
        while i < head.end && (self.tokens[i].is_ident("static") || self.tokens[i].is_ident("type"))
        {
            i += 1;
        }
        // `using (...)` statements and `using Alias = X;` are not imports we track.
        if self.is_punct(i, "(") || self.tokens[head.clone()].iter().any(|t| t.is_punct("=")) {
            return;
        }

        let mut path = String::new();
        while i < head.end {
            let t = &self.tokens[i];
            match t.kind {
                TokenKind::Ident if t.text == "as" => break,
                TokenKind::Ident => path.push_str(&t.text),
                TokenKind::Punct if t.text == "." || t.text == "*" => path.push_str(&t.text),
                _ => break,
            }
            i += 1;
        }
        if !path.is_empty() {
            self.imports.push(Import { path, line });
        }
    }

    fn dotted_name(&self, mut i: usize, end: usize) -> String {
        let mut name = String::new();
        while i < end {
            let t = &self.tokens[i];
            match t.kind {
                TokenKind::Ident => name.push_str(&t.text),
                TokenKind::Punct if t.text == "." => name.push('.'),
                _ => break,
            }
            i += 1;
        }
        name
    }

    /// Skip a `<...>` generic list starting at `i`.
    fn skip_angles(&self, mut i: usize, end: usize) -> usize {
        if !self.is_punct(i, "<") {
            return i;
        }
        let mut depth = 0usize;
        while i < end {
            let t = &self.tokens[i];
            if t.is_punct("<") {
                depth += 1;
            } else if t.is_punct(">") {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            } else if t.is_punct("(") || t.is_punct("[") {
                i = self.partner(i);
            }
            i += 1;
        }
        end
    }

    fn parse_type(
        &mut self,
        item: &Item,
        kind: TypeKind,
        mut i: usize,
        modifiers: &[&str],
        owner: Option<usize>,
    ) {
        let head_end = item.head.end;
        // `record struct`, `enum class`
        if self
            .tok(i)
            .is_some_and(|t| i < head_end && TypeKind::from_keyword(&t.text).is_some())
        {
            i += 1;
        }
        let Some(name_tok) = self.tok(i).filter(|t| i < head_end && t.kind == TokenKind::Ident)
        else {
            return;
        };
        let name = name_tok.text.clone();
        i = self.skip_angles(i + 1, head_end);

        let start_line = self.tokens[item.head.start].line;
        let mut constructors = Vec::new();
        if self.is_punct(i, "(") && i < head_end {
            let close = self.partner(i);
            constructors.push(MethodDecl {
                name: name.clone(),
                params: self.params(i + 1, close),
                is_public: true,
                has_doc_comment: self.has_doc(item),
                span: Span::new(start_line, self.tokens[close].line),
                statements: Vec::new(),
                and_ops: 0,
                or_ops: 0,
                ternaries: 0,
            });
            i = close + 1;
        }

        let bases = self.bases(i, head_end);
        let owner_is_interface = owner.is_some_and(|o| self.types[o].kind == TypeKind::Interface);
        let decl = TypeDecl {
            name,
            kind,
            bases,
            is_public: is_public(modifiers) || owner_is_interface,
            has_doc_comment: self.has_doc(item),
            span: Span::new(start_line, item.end_line),
            methods: Vec::new(),
            constructors,
        };
        self.types.push(decl);
        let idx = self.types.len() - 1;

        if let Body::Block(open, close) = item.body {
            if kind != TypeKind::Enum {
                self.parse_scope(open + 1, close, Some(idx));
            }
        }
    }

    fn bases(&self, mut i: usize, end: usize) -> Vec<String> {
        let mut bases = Vec::new();
        let mut collecting = false;
        let mut current: Option<String> = None;

        let finish = |current: &mut Option<String>, bases: &mut Vec<String>| {
            if let Some(name) = current.take() {
                bases.push(name);
            }
        };

        while i < end {
            let t = &self.tokens[i];
            match t.kind {
                TokenKind::Ident if t.text == "where" || t.text == "permits" => break,
                TokenKind::Ident if t.text == "extends" || t.text == "implements" => {
                    finish(&mut current, &mut bases);
                    collecting = true;
                }
                TokenKind::Punct if t.text == ":" => {
                    finish(&mut current, &mut bases);
                    collecting = true;
                }
                TokenKind::Ident if collecting => {
                    // Keep the last segment of a dotted name.
                    current = Some(t.text.clone());
                }
                TokenKind::Punct if t.text == "<" => {
                    i = self.skip_angles(i, end);
                    continue;
                }
                TokenKind::Punct if t.text == "(" => {
                    i = self.partner(i) + 1;
                    continue;
                }
                TokenKind::Punct if t.text == "," => finish(&mut current, &mut bases),
                _ => {}
            }
            i += 1;
        }
        finish(&mut current, &mut bases);
        bases
    }

    fn parse_member(&mut self, item: &Item, i: usize, modifiers: &[&str], owner: Option<usize>) {
        let head = item.head.clone();

        let Some(paren) = (i..head.end).find(|&k| self.is_punct(k, "(")) else {
            return;
        };
        if (i..paren).any(|k| self.is_punct(k, "=")) {
            return;
        }

        // Walk back over `<T>` to the name.
        let mut name_idx = paren.checked_sub(1);
        if let Some(k) = name_idx {
            if self.is_punct(k, ">") {
                let mut depth = 0usize;
                let mut k = k;
                loop {
                    if self.is_punct(k, ">") {
                        depth += 1;
                    } else if self.is_punct(k, "<") {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    if k <= i {
                        return;
                    }
                    k -= 1;
                }
                name_idx = k.checked_sub(1);
            }
        }
        let Some(name_idx) = name_idx.filter(|&k| k >= i) else {
            return;
        };
        let name_tok = &self.tokens[name_idx];
        if name_tok.kind != TokenKind::Ident
            || NON_DECLARATION_NAMES.contains(&name_tok.text.as_str())
        {
            return;
        }

        let preceding = (name_idx > i).then(|| &self.tokens[name_idx - 1]);
        match preceding {
            Some(p) if p.is_punct(".") || p.is_ident("new") || p.is_ident("return") => return,
            None if owner.is_none() && modifiers.is_empty() => return,
            _ => {}
        }

        let name = name_tok.text.clone();
        let close = self.partner(paren);
        let params = self.params(paren + 1, close);
        let (statements, and_ops, or_ops, ternaries) = match &item.body {
            Body::Block(open, close) => self.body_metrics(open + 1, *close),
            Body::Expr(range) => self.body_metrics(range.start, range.end),
            Body::None => (Vec::new(), 0, 0, 0),
        };

        let owner_is_interface = owner.is_some_and(|o| self.types[o].kind == TypeKind::Interface);
        let method = MethodDecl {
            name: name.clone(),
            params,
            is_public: is_public(modifiers) || owner_is_interface,
            has_doc_comment: self.has_doc(item),
            span: Span::new(self.tokens[head.start].line, item.end_line),
            statements,
            and_ops,
            or_ops,
            ternaries,
        };

        match owner {
            Some(o) => {
                let decl = &mut self.types[o];
                if name == decl.name || name == "constructor" {
                    decl.constructors.push(method);
                } else {
                    decl.methods.push(method);
                }
            }
            None => self.functions.push(method),
        }
    }

    fn params(&self, start: usize, end: usize) -> Vec<Param> {
        let mut params = Vec::new();
        let mut piece_start = start;
        let mut angle = 0i32;
        let mut k = start;
        while k <= end {
            if k == end || (angle == 0 && self.is_punct(k, ",")) {
                if let Some(p) = self.param(piece_start, k) {
                    params.push(p);
                }
                piece_start = k + 1;
                k += 1;
                continue;
            }
            let t = &self.tokens[k];
            if t.is_punct("(") || t.is_punct("[") || t.is_punct("{") {
                k = self.partner(k) + 1;
                continue;
            }
            if t.is_punct("<") {
                angle += 1;
            } else if t.is_punct(">") {
                angle -= 1;
            }
            k += 1;
        }
        params
    }

    fn param(&self, start: usize, end: usize) -> Option<Param> {
        let mut k = self.skip_attributes(start, end);
        while k < end
            && self.tokens[k].kind == TokenKind::Ident
            && PARAM_MODIFIERS.contains(&self.tokens[k].text.as_str())
            && k + 1 < end
        {
            k += 1;
        }
        let end = (k..end).find(|&j| self.is_punct(j, "=")).unwrap_or(end);
        if k >= end {
            return None;
        }

        let tokens = &self.tokens[k..end];
        if let Some(colon) = tokens.iter().position(|t| t.is_punct(":")) {
            let name = tokens[..colon]
                .iter()
                .rev()
                .find(|t| t.kind == TokenKind::Ident)?
                .text
                .clone();
            let type_name = join(&tokens[colon + 1..]);
            return Some(Param {
                name,
                type_name: (!type_name.is_empty()).then_some(type_name),
            });
        }

        let name_pos = tokens.iter().rposition(|t| t.kind == TokenKind::Ident)?;
        let type_name = join(&tokens[..name_pos]);
        Some(Param {
            name: tokens[name_pos].text.trim_start_matches("...").to_string(),
            type_name: (!type_name.is_empty()).then_some(type_name),
        })
    }

    fn body_metrics(&self, start: usize, end: usize) -> (Vec<StatementKind>, u32, u32, u32) {
        let mut statements = Vec::new();
        let (mut and_ops, mut or_ops, mut ternaries) = (0, 0, 0);
        for k in start..end.min(self.tokens.len()) {
            let t = &self.tokens[k];
            match t.kind {
                TokenKind::Ident => {
                    if let Some(s) = StatementKind::from_keyword(&t.text) {
                        statements.push(s);
                    }
                }
                TokenKind::Punct => match t.text.as_str() {
                    "&&" => and_ops += 1,
                    "||" => or_ops += 1,
                    "?" if self.is_ternary(k, end) => ternaries += 1,
                    _ => {}
                },
                _ => {}
            }
        }
        (statements, and_ops, or_ops, ternaries)
    }

    /// A lone `?` followed by `:` at the same depth before the statement ends.
    fn is_ternary(&self, q: usize, end: usize) -> bool {
        if self.is_punct(q + 1, ":") {
            return false;
        }
        let mut k = q + 1;
        while k < end {
            let t = &self.tokens[k];
            if t.kind == TokenKind::Punct {
                match t.text.as_str() {
                    ":" => return true,
                    "(" | "[" | "{" => {
                        k = self.partner(k) + 1;
                        continue;
                    }
                    ";" | ")" | "]" | "}" => return false,
                    _ => {}
                }
            }
            k += 1;
        }
        false
    }
}

fn is_public(modifiers: &[&str]) -> bool {
    modifiers
        .iter()
        .any(|m| matches!(*m, "public" | "export" | "protected"))
}

fn join(tokens: &[Token]) -> String {
    let mut out = String::new();
    for t in tokens {
        let tight = matches!(t.text.as_str(), "." | "<" | ">" | "," | "?" | "[" | "]")
            || out.ends_with(['.', '<', '[']);
        if !out.is_empty() && !tight {
            out.push(' ');
        }
        out.push_str(&t.text);
        if t.text == "," {
            out.push(' ');
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGENT: &str = r#"
using System;
using System.Collections.Generic;
using Company.Agents.Core;

namespace Company.Agents.Orders
{
    /// <summary>Handles orders.</summary>
    public class OrderAgent : BaseAgent, IAuditable
    {
        private readonly ILogger _logger;

        public OrderAgent(ILogger logger, IOrderRepository repo) : base(logger)
        {
            _logger = logger;
        }

        /// <summary>Runs.</summary>
        [Obsolete("use RunAsync")]
        public void Run(string input)
        {
            if (input == null) return;
            try { Process(input); } catch (Exception ex) { _logger.Log(ex); }
        }

        private int Score(int a, int b) => a > b && b > 0 ? a : b;

        internal class Nested { }
    }
}
"#;

    #[test]
    fn test_parses_namespace_imports_and_type() {
        let m = parse_source("OrderAgent.cs", AGENT).unwrap();
        assert_eq!(m.namespace.as_deref(), Some("Company.Agents.Orders"));
        let paths: Vec<_> = m.imports.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["System", "System.Collections.Generic", "Company.Agents.Core"]
        );

        assert_eq!(m.types.len(), 2);
        let agent = &m.types[0];
        assert_eq!(agent.name, "OrderAgent");
        assert_eq!(agent.kind, TypeKind::Class);
        assert_eq!(agent.bases, vec!["BaseAgent", "IAuditable"]);
        assert!(agent.is_public);
        assert!(agent.has_doc_comment);
        assert_eq!(m.types[1].name, "Nested");
        assert!(!m.types[1].is_public);
    }

    #[test]
    fn test_constructor_and_methods() {
        let m = parse_source("OrderAgent.cs", AGENT).unwrap();
        let agent = &m.types[0];
        assert_eq!(agent.constructors.len(), 1);
        let ctor = &agent.constructors[0];
        assert_eq!(ctor.params.len(), 2);
        assert_eq!(ctor.params[0].name, "logger");
        assert_eq!(ctor.params[0].type_name.as_deref(), Some("ILogger"));

        let names: Vec<_> = agent.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Run", "Score"]);

        let run = &agent.methods[0];
        assert!(run.is_public);
        assert!(run.has_doc_comment);
        assert_eq!(run.span.line_count(), 5);
        assert_eq!(run.cyclomatic_complexity(), 3);

        let score = &agent.methods[1];
        assert!(!score.is_public);
        assert_eq!(score.and_ops, 1);
        assert_eq!(score.ternaries, 1);
        assert_eq!(score.cyclomatic_complexity(), 3);
    }

    #[test]
    fn test_literals_exclude_imports() {
        let src = "import { x } from \"lodash-es\";\nexport function go(): string { return \"hello world\"; }";
        let m = parse_source("go.ts", src).unwrap();
        assert_eq!(m.imports[0].path, "lodash-es");
        assert_eq!(m.literals.len(), 1);
        assert_eq!(m.literals[0].value, "hello world");
        assert_eq!(m.functions.len(), 1);
        assert_eq!(m.functions[0].name, "go");
        assert!(m.functions[0].is_public);
    }

    #[test]
    fn test_typescript_class() {
        let src = r#"
export class PaymentService implements Service {
  constructor(private readonly client: HttpClient, retries: number = 3) {}

  async charge(amount: number): Promise<void> {
    for (const x of [1, 2]) { if (amount > x || amount < 0) { throw new Error("bad"); } }
  }
}
"#;
        let m = parse_source("payment.ts", src).unwrap();
        let t = &m.types[0];
        assert_eq!(t.bases, vec!["Service"]);
        assert_eq!(t.constructors.len(), 1);
        assert_eq!(t.constructors[0].params.len(), 2);
        assert_eq!(t.constructors[0].params[0].name, "client");
        assert_eq!(t.constructors[0].params[1].type_name.as_deref(), Some("number"));
        assert_eq!(t.methods[0].name, "charge");
        assert_eq!(t.methods[0].cyclomatic_complexity(), 4);
    }

    #[test]
    fn test_java_package_and_generic_method() {
        let src = r#"
package com.acme.billing;

import java.util.List;
import static org.junit.Assert.*;

public final class Invoices extends Base<Invoice> implements Closeable {
    @Override
    public <T> List<T> load(Map<String, Integer> index, int count) throws IOException {
        while (count > 0) { count--; }
        return null;
    }
}
"#;
        let m = parse_source("Invoices.java", src).unwrap();
        assert_eq!(m.namespace.as_deref(), Some("com.acme.billing"));
        assert_eq!(m.imports[1].path, "org.junit.Assert.*");
        let t = &m.types[0];
        assert_eq!(t.bases, vec!["Base", "Closeable"]);
        let load = &t.methods[0];
        assert_eq!(load.name, "load");
        assert_eq!(load.params.len(), 2);
        assert_eq!(load.params[0].name, "index");
        assert_eq!(load.cyclomatic_complexity(), 2);
    }

    #[test]
    fn test_calls_are_not_declarations() {
        let src = "Console.WriteLine(\"x\");\nfoo();\nvar y = Bar(1);";
        let m = parse_source("Program.cs", src).unwrap();
        assert!(m.functions.is_empty());
    }

    #[test]
    fn test_nullable_is_not_ternary() {
        let src = "class A { void F() { string? s = null; var t = s ?? \"x\"; } }";
        let m = parse_source("A.cs", src).unwrap();
        assert_eq!(m.types[0].methods[0].ternaries, 0);
    }

    #[test]
    fn test_record_primary_constructor() {
        let src = "public record Person(string First, string Last);";
        let m = parse_source("Person.cs", src).unwrap();
        assert_eq!(m.types[0].kind, TypeKind::Record);
        assert_eq!(m.types[0].constructors[0].params.len(), 2);
    }

    #[test]
    fn test_unbalanced_braces() {
        assert_eq!(
            parse_source("a.cs", "class A {\n void F() {\n}").unwrap_err(),
            ParseError::Unclosed {
                delimiter: '{',
                line: 1
            }
        );
        assert_eq!(
            parse_source("a.cs", "class A { }\n}").unwrap_err(),
            ParseError::UnexpectedCloser {
                found: '}',
                line: 2
            }
        );
        assert_eq!(
            parse_source("a.cs", "class A { void F( } }").unwrap_err(),
            ParseError::Mismatched {
                expected: ')',
                found: '}',
                line: 1
            }
        );
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(parse_source("a.cs", "  \n ").unwrap_err(), ParseError::Empty);
    }

    #[test]
    fn test_enclosing_symbol() {
        let m = parse_source("OrderAgent.cs", AGENT).unwrap();
        let run = &m.types[0].methods[0];
        assert_eq!(
            m.enclosing_symbol(run.span.start_line + 2).as_deref(),
            Some("OrderAgent.Run")
        );
    }
}
