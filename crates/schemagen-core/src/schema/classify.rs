//! Field type classification.
//!
//! Turns a member's type expression into the normalized signature stored on
//! the field, the local record it refers to (if any) and a complication
//! marker. Classification is total: shapes it cannot reason about come back
//! with an empty signature and no relation.

use std::collections::HashSet;

use crate::models::{Complicated, TypeDecl, TypeExpr, ANY_SIGNATURE};

/// Names of the struct types declared in the file being analysed.
#[derive(Clone, Debug, Default)]
pub struct LocalRecords {
    names: HashSet<String>,
}

impl LocalRecords {
    pub fn from_declarations(declarations: &[TypeDecl]) -> Self {
        Self {
            names: declarations
                .iter()
                .filter(|d| d.is_struct())
                .map(|d| d.name.clone())
                .collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// The record a bare name resolves to, if it is one.
    fn resolve<'e>(&self, expr: &'e TypeExpr) -> Option<&'e str> {
        match expr {
            TypeExpr::Name(name) if self.contains(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

impl<S: Into<String>> FromIterator<S> for LocalRecords {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classified {
    pub signature: String,
    /// Local record the field refers to.
    pub relation: Option<String>,
    pub complicated: Complicated,
}

impl Classified {
    fn scalar(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            ..Self::default()
        }
    }

    fn related(signature: impl Into<String>, record: &str) -> Self {
        Self {
            signature: signature.into(),
            relation: Some(record.to_string()),
            complicated: Complicated::None,
        }
    }
}

pub fn classify(expr: &TypeExpr, locals: &LocalRecords) -> Classified {
    match expr {
        TypeExpr::Name(name) => match locals.resolve(expr) {
            Some(record) => Classified::related(record, record),
            None => Classified::scalar(name.as_str()),
        },

        TypeExpr::Interface { methods: 0, .. } => Classified::scalar(ANY_SIGNATURE),
        TypeExpr::Interface { text, .. } => Classified {
            signature: text.clone(),
            relation: None,
            complicated: Complicated::Interface,
        },

        // Maps never become relations, whatever the value type is.
        TypeExpr::Map { key, value } => {
            let complicated = if locals.resolve(key).is_some()
                || key.is_collection()
                || value.is_collection()
            {
                Complicated::NestedMap
            } else {
                Complicated::None
            };
            Classified {
                signature: render(expr),
                relation: None,
                complicated,
            }
        }

        TypeExpr::Array { elem, .. } => {
            let signature = render(expr);
            if elem.is_collection() {
                return Classified {
                    signature,
                    relation: None,
                    complicated: Complicated::NestedArray,
                };
            }
            match locals.resolve(elem) {
                Some(record) => Classified::related(signature, record),
                None => Classified::scalar(signature),
            }
        }

        TypeExpr::Qualified { .. } => Classified::scalar(render(expr)),

        TypeExpr::Pointer(inner) => match inner.as_ref() {
            TypeExpr::Qualified { .. } => Classified::scalar(render(expr)),
            // The pointer marker is dropped from the stored signature.
            TypeExpr::Name(name) => match locals.resolve(inner) {
                Some(record) => Classified::related(record, record),
                None => Classified::scalar(name.as_str()),
            },
            _ => Classified::default(),
        },

        TypeExpr::Opaque(_) => Classified::default(),
    }
}

/// Print a type expression as a normalized signature.
pub fn render(expr: &TypeExpr) -> String {
    match expr {
        TypeExpr::Name(name) => name.clone(),
        TypeExpr::Qualified { package, name } => format!("{package}.{name}"),
        TypeExpr::Pointer(inner) => format!("*{}", render(inner)),
        TypeExpr::Map { key, value } => format!("map[{}]{}", render(key), render(value)),
        TypeExpr::Array { len: Some(len), elem } => format!("[{len}]{}", render(elem)),
        TypeExpr::Array { len: None, elem } => format!("[]{}", render(elem)),
        TypeExpr::Interface { methods: 0, .. } => ANY_SIGNATURE.to_string(),
        TypeExpr::Interface { text, .. } => text.clone(),
        TypeExpr::Opaque(text) => text.clone(),
    }
}
