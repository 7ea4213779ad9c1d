//! Shared typed models: the parsed declaration shapes handed over by the
//! parser, and the relational schema built from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Relational conventions
// ---------------------------------------------------------------------------

/// Name of the synthesized primary-key field.
pub const IDENTITY_FIELD: &str = "ID";

/// Type given to synthesized identity and foreign-key fields.
pub const KEY_TYPE: &str = "int";

/// Signature used for an interface type without methods.
pub const ANY_SIGNATURE: &str = "interface{}";

/// Name of the foreign-key field pointing at `parent`.
pub fn foreign_key_name(parent: &str) -> String {
    format!("{parent}{IDENTITY_FIELD}")
}

// ---------------------------------------------------------------------------
// Declarations (parser output)
// ---------------------------------------------------------------------------

/// One parsed source file: its package clause and every type declaration in
/// source order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceFile {
    pub package: String,
    pub declarations: Vec<TypeDecl>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeDeclKind,
    /// Byte offset just past the `{` opening a struct body, when parsed from
    /// source text.
    pub body_offset: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeDeclKind {
    Struct(Vec<Member>),
    /// Aliases, interfaces and named non-struct types.
    Other,
}

impl TypeDecl {
    pub fn structure(name: impl Into<String>, members: Vec<Member>) -> Self {
        Self {
            name: name.into(),
            kind: TypeDeclKind::Struct(members),
            body_offset: None,
        }
    }

    pub fn with_body_offset(mut self, offset: usize) -> Self {
        self.body_offset = Some(offset);
        self
    }

    pub fn other(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeDeclKind::Other,
            body_offset: None,
        }
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TypeDeclKind::Struct(_))
    }
}

/// A struct member. `A, B int` is lowered to two `Named` members.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Member {
    Embedded(TypeExpr),
    Named { name: String, ty: TypeExpr },
}

impl Member {
    pub fn named(name: impl Into<String>, ty: TypeExpr) -> Self {
        Member::Named {
            name: name.into(),
            ty,
        }
    }
}

/// Shape of a declared type expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeExpr {
    /// A bare identifier: builtin, local type or local record.
    Name(String),
    /// `pkg.Name`
    Qualified { package: String, name: String },
    Pointer(Box<TypeExpr>),
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    /// Fixed-length array when `len` is set, slice otherwise.
    Array {
        len: Option<String>,
        elem: Box<TypeExpr>,
    },
    /// `methods` counts every element of the interface body.
    Interface { methods: usize, text: String },
    /// Channels, functions, anonymous structs, generic instantiations.
    Opaque(String),
}

impl TypeExpr {
    pub fn name(name: impl Into<String>) -> Self {
        TypeExpr::Name(name.into())
    }

    pub fn qualified(package: impl Into<String>, name: impl Into<String>) -> Self {
        TypeExpr::Qualified {
            package: package.into(),
            name: name.into(),
        }
    }

    pub fn pointer(inner: TypeExpr) -> Self {
        TypeExpr::Pointer(Box::new(inner))
    }

    pub fn map(key: TypeExpr, value: TypeExpr) -> Self {
        TypeExpr::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn slice(elem: TypeExpr) -> Self {
        TypeExpr::Array {
            len: None,
            elem: Box::new(elem),
        }
    }

    pub fn array(len: impl Into<String>, elem: TypeExpr) -> Self {
        TypeExpr::Array {
            len: Some(len.into()),
            elem: Box::new(elem),
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, TypeExpr::Map { .. } | TypeExpr::Array { .. })
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }

    /// Source line emitted into a struct body.
    pub fn declaration(&self) -> String {
        format!("{} {}", self.name, self.ty)
    }
}

/// An edge from a containing record to a record it embeds or holds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Containing field name; empty for an embedded member.
    pub field: String,
    /// Name of the contained record.
    pub record: String,
    pub signature: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complicated {
    #[default]
    None,
    /// Interface exposing at least one method.
    Interface,
    NestedMap,
    NestedArray,
}

impl Complicated {
    pub fn is_none(self) -> bool {
        self == Complicated::None
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub fields: Vec<Field>,
    pub parents: Vec<String>,
    pub relations: Vec<Relation>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub complicated: BTreeMap<String, Complicated>,
    /// Where derived fields are spliced into the source declaration.
    #[serde(skip)]
    pub body_offset: Option<usize>,
}

impl Record {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A record holding at least one relation.
    pub fn is_container(&self) -> bool {
        !self.relations.is_empty()
    }

    pub fn has_field_named(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// The records of one file, parents already assigned.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileSchema {
    pub package: String,
    pub records: Vec<Record>,
}

impl FileSchema {
    pub fn record(&self, name: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.name == name)
    }
}

/// Aggregate schema of a whole run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub package: Option<String>,
    pub records: Vec<Record>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file's records. The package is taken from the first file only.
    pub fn absorb(&mut self, schema: FileSchema) {
        if self.package.is_none() && !schema.package.is_empty() {
            self.package = Some(schema.package);
        }
        self.records.extend(schema.records);
    }

    pub fn record(&self, name: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
