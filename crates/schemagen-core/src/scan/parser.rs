//! Go source parsing with tree-sitter, lowered into the declaration model
//! consumed by the schema passes.

use std::path::Path;

use tree_sitter::{Node, Parser};

use crate::errors::{SchemaGenError, SchemaGenResult};
use crate::models::{Member, SourceFile, TypeDecl, TypeExpr};

fn go_parser() -> Result<Parser, String> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| format!("Failed to set language: {e}"))?;
    Ok(parser)
}

/// Parse `source` and collect every type declaration in source order,
/// including grouped `type ( ... )` blocks and function-local types.
pub fn parse_source(path: &Path, source: &str) -> SchemaGenResult<SourceFile> {
    let parse_error = |message: String| SchemaGenError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let mut parser = go_parser().map_err(parse_error)?;
    let tree = parser
        .parse(source.as_bytes(), None)
        .ok_or_else(|| parse_error("parser produced no tree".to_string()))?;

    let root = tree.root_node();
    if root.has_error() {
        let line = first_error_line(root).unwrap_or(1);
        return Err(parse_error(format!("syntax error at line {line}")));
    }

    let src = source.as_bytes();
    let mut file = SourceFile::default();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        if child.kind() == "package_clause" {
            if let Some(ident) = child.named_child(0) {
                file.package = text(ident, src).to_string();
            }
            break;
        }
    }

    collect_type_specs(root, src, &mut file.declarations);
    Ok(file)
}

fn first_error_line(node: Node<'_>) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error())
        .find_map(first_error_line)
}

fn text<'s>(node: Node<'_>, src: &'s [u8]) -> &'s str {
    node.utf8_text(src).unwrap_or_default()
}

fn squash(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_type_specs(node: Node<'_>, src: &[u8], out: &mut Vec<TypeDecl>) {
    match node.kind() {
        "type_spec" => {
            if let Some(decl) = lower_type_spec(node, src) {
                out.push(decl);
            }
        }
        "type_alias" => {
            if let Some(name) = node.child_by_field_name("name") {
                out.push(TypeDecl::other(text(name, src)));
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
    for child in children {
        collect_type_specs(child, src, out);
    }
}

fn lower_type_spec(node: Node<'_>, src: &[u8]) -> Option<TypeDecl> {
    let name = text(node.child_by_field_name("name")?, src).to_string();
    let ty = node.child_by_field_name("type")?;
    if ty.kind() != "struct_type" {
        return Some(TypeDecl::other(name));
    }

    let mut members = Vec::new();
    let mut body_offset = None;
    let mut cursor = ty.walk();
    let lists: Vec<Node<'_>> = ty
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "field_declaration_list")
        .collect();
    for list in lists {
        // The list node starts at its opening brace.
        body_offset.get_or_insert(list.start_byte() + 1);
        let mut list_cursor = list.walk();
        let fields: Vec<Node<'_>> = list
            .named_children(&mut list_cursor)
            .filter(|c| c.kind() == "field_declaration")
            .collect();
        for field in fields {
            lower_field(field, src, &mut members);
        }
    }

    let decl = TypeDecl::structure(name, members);
    Some(match body_offset {
        Some(offset) => decl.with_body_offset(offset),
        None => decl,
    })
}

fn lower_field(node: Node<'_>, src: &[u8], members: &mut Vec<Member>) {
    let Some(ty_node) = node.child_by_field_name("type") else {
        return;
    };
    let ty = lower_type(ty_node, src);

    let mut cursor = node.walk();
    let names: Vec<String> = node
        .children_by_field_name("name", &mut cursor)
        .map(|n| text(n, src).to_string())
        .collect();

    if names.is_empty() {
        let mut cursor = node.walk();
        let starred = node
            .children(&mut cursor)
            .any(|c| !c.is_named() && c.kind() == "*");
        members.push(Member::Embedded(if starred {
            TypeExpr::pointer(ty)
        } else {
            ty
        }));
        return;
    }

    for name in names {
        members.push(Member::named(name, ty.clone()));
    }
}

pub fn lower_type(node: Node<'_>, src: &[u8]) -> TypeExpr {
    let field = |name: &str| node.child_by_field_name(name);
    let opaque = || TypeExpr::Opaque(squash(text(node, src)));

    match node.kind() {
        "type_identifier" => TypeExpr::name(text(node, src)),
        "qualified_type" => match (field("package"), field("name")) {
            (Some(package), Some(name)) => TypeExpr::qualified(text(package, src), text(name, src)),
            _ => opaque(),
        },
        "pointer_type" => match node.named_child(0) {
            Some(inner) => TypeExpr::pointer(lower_type(inner, src)),
            None => opaque(),
        },
        "map_type" => match (field("key"), field("value")) {
            (Some(key), Some(value)) => TypeExpr::map(lower_type(key, src), lower_type(value, src)),
            _ => opaque(),
        },
        "slice_type" => match field("element") {
            Some(elem) => TypeExpr::slice(lower_type(elem, src)),
            None => opaque(),
        },
        "array_type" => match (field("length"), field("element")) {
            (Some(len), Some(elem)) => TypeExpr::array(squash(text(len, src)), lower_type(elem, src)),
            _ => opaque(),
        },
        "interface_type" => {
            let mut cursor = node.walk();
            let methods = node
                .named_children(&mut cursor)
                .filter(|c| c.kind() != "comment")
                .count();
            TypeExpr::Interface {
                methods,
                text: squash(text(node, src)),
            }
        }
        _ => opaque(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TypeDeclKind;

    fn parse(src: &str) -> SourceFile {
        parse_source(Path::new("models.go"), src).unwrap()
    }

    fn members(file: &SourceFile, name: &str) -> Vec<Member> {
        let decl = file.declarations.iter().find(|d| d.name == name).unwrap();
        match &decl.kind {
            TypeDeclKind::Struct(members) => members.clone(),
            TypeDeclKind::Other => panic!("{name} is not a struct"),
        }
    }

    #[test]
    fn package_and_declaration_order() {
        let file = parse(
            "\
package models

type Status int

type User struct {
\tName string
}

type (
\tOrder struct{}
\tAlias = User
)
",
        );
        assert_eq!(file.package, "models");
        let names: Vec<(&str, bool)> = file
            .declarations
            .iter()
            .map(|d| (d.name.as_str(), d.is_struct()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Status", false),
                ("User", true),
                ("Order", true),
                ("Alias", false),
            ]
        );
    }

    #[test]
    fn embedded_members() {
        let file = parse(
            "\
package models

type Parent struct {
\tChild
\t*Other
\tsync.Mutex
}
",
        );
        assert_eq!(
            members(&file, "Parent"),
            vec![
                Member::Embedded(TypeExpr::name("Child")),
                Member::Embedded(TypeExpr::pointer(TypeExpr::name("Other"))),
                Member::Embedded(TypeExpr::qualified("sync", "Mutex")),
            ]
        );
    }

    #[test]
    fn named_member_shapes() {
        let file = parse(
            "\
package models

type Shape struct {
\tA, B    int
\tTags    []string
\tGrid    [3]byte
\tIndex   map[string]*User
\tCreated time.Time
\tOwner   *User
\tAny     interface{}
\tCloser  interface{ Close() error }
\tEvents  chan int `json:\"events\"`
}
",
        );
        assert_eq!(
            members(&file, "Shape"),
            vec![
                Member::named("A", TypeExpr::name("int")),
                Member::named("B", TypeExpr::name("int")),
                Member::named("Tags", TypeExpr::slice(TypeExpr::name("string"))),
                Member::named("Grid", TypeExpr::array("3", TypeExpr::name("byte"))),
                Member::named(
                    "Index",
                    TypeExpr::map(
                        TypeExpr::name("string"),
                        TypeExpr::pointer(TypeExpr::name("User")),
                    ),
                ),
                Member::named("Created", TypeExpr::qualified("time", "Time")),
                Member::named("Owner", TypeExpr::pointer(TypeExpr::name("User"))),
                Member::named(
                    "Any",
                    TypeExpr::Interface {
                        methods: 0,
                        text: "interface{}".to_string(),
                    },
                ),
                Member::named(
                    "Closer",
                    TypeExpr::Interface {
                        methods: 1,
                        text: "interface{ Close() error }".to_string(),
                    },
                ),
                Member::named("Events", TypeExpr::Opaque("chan int".to_string())),
            ]
        );
    }

    #[test]
    fn function_local_types_are_visited() {
        let file = parse(
            "\
package main

func main() {
\ttype local struct{ N int }
}
",
        );
        assert_eq!(file.declarations.len(), 1);
        assert_eq!(file.declarations[0].name, "local");
    }

    #[test]
    fn syntax_errors_fail_the_file() {
        let err = parse_source(Path::new("broken.go"), "package x\n\ntype A struct {\n").unwrap_err();
        match err {
            SchemaGenError::Parse { path, message } => {
                assert_eq!(path, Path::new("broken.go"));
                assert!(message.starts_with("syntax error at line"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
