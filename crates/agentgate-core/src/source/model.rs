//! Language-agnostic structural model of one candidate.

use serde::{Deserialize, Serialize};

/// Inclusive line range of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start_line: u32,
    pub end_line: u32,
}

impl Span {
    pub fn new(start_line: u32, end_line: u32) -> Self {
        Self {
            start_line,
            end_line: end_line.max(start_line),
        }
    }

    pub fn line_count(&self) -> u32 {
        self.end_line - self.start_line + 1
    }

    pub fn contains(&self, line: u32) -> bool {
        (self.start_line..=self.end_line).contains(&line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    pub path: String,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringLiteral {
    pub value: String,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Interface,
    Struct,
    Record,
    Enum,
}

impl TypeKind {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "class" => Some(Self::Class),
            "interface" => Some(Self::Interface),
            "struct" => Some(Self::Struct),
            "record" => Some(Self::Record),
            "enum" => Some(Self::Enum),
            _ => None,
        }
    }
}

/// Control-flow statements found in a method body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    If,
    Else,
    While,
    Do,
    For,
    Foreach,
    Switch,
    Case,
    Try,
    Catch,
    Finally,
    Return,
    Throw,
    Break,
    Continue,
}

impl StatementKind {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "if" => Some(Self::If),
            "else" => Some(Self::Else),
            "while" => Some(Self::While),
            "do" => Some(Self::Do),
            "for" => Some(Self::For),
            "foreach" => Some(Self::Foreach),
            "switch" => Some(Self::Switch),
            "case" => Some(Self::Case),
            "try" => Some(Self::Try),
            "catch" => Some(Self::Catch),
            "finally" => Some(Self::Finally),
            "return" => Some(Self::Return),
            "throw" => Some(Self::Throw),
            "break" => Some(Self::Break),
            "continue" => Some(Self::Continue),
            _ => None,
        }
    }

    /// Whether the statement opens a decision point.
    pub fn is_branch(self) -> bool {
        matches!(
            self,
            Self::If | Self::While | Self::For | Self::Foreach | Self::Case | Self::Catch
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub type_name: Option<String>,
}

/// A method, constructor, or free function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub is_public: bool,
    pub has_doc_comment: bool,
    pub span: Span,
    pub statements: Vec<StatementKind>,
    pub and_ops: u32,
    pub or_ops: u32,
    pub ternaries: u32,
}

impl MethodDecl {
    /// `1 + branches + && + || + ternaries`.
    pub fn cyclomatic_complexity(&self) -> u32 {
        let branches = self.statements.iter().filter(|s| s.is_branch()).count() as u32;
        1 + branches + self.and_ops + self.or_ops + self.ternaries
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
    /// Base class and implemented interfaces, in declaration order.
    pub bases: Vec<String>,
    pub is_public: bool,
    pub has_doc_comment: bool,
    pub span: Span,
    pub methods: Vec<MethodDecl>,
    pub constructors: Vec<MethodDecl>,
}

impl TypeDecl {
    pub fn has_base(&self, base: &str) -> bool {
        self.bases.iter().any(|b| b == base)
    }
}

/// Parsed structure of one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceModel {
    pub file_name: String,
    pub namespace: Option<String>,
    pub imports: Vec<Import>,
    /// Types in source order, nested types flattened after their parent.
    pub types: Vec<TypeDecl>,
    /// Top-level functions outside any type.
    pub functions: Vec<MethodDecl>,
    pub literals: Vec<StringLiteral>,
    pub line_count: u32,
}

impl SourceModel {
    /// Every method in the file, paired with its owning type name.
    pub fn all_methods(&self) -> impl Iterator<Item = (Option<&str>, &MethodDecl)> {
        self.types
            .iter()
            .flat_map(|t| {
                t.methods
                    .iter()
                    .chain(t.constructors.iter())
                    .map(move |m| (Some(t.name.as_str()), m))
            })
            .chain(self.functions.iter().map(|m| (None, m)))
    }

    /// Innermost `Type.Member` (or `Type`) covering `line`.
    pub fn enclosing_symbol(&self, line: u32) -> Option<String> {
        let owner = self
            .types
            .iter()
            .filter(|t| t.span.contains(line))
            .min_by_key(|t| t.span.line_count())?;
        let member = owner
            .methods
            .iter()
            .chain(owner.constructors.iter())
            .find(|m| m.span.contains(line));
        Some(match member {
            Some(m) => format!("{}.{}", owner.name, m.name),
            None => owner.name.clone(),
        })
    }

    /// Every declared type name.
    pub fn declared_names(&self) -> Vec<String> {
        self.types.iter().map(|t| t.name.clone()).collect()
    }
}
