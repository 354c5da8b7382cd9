//! Member signature keys used to detect duplicate overloads.
//!
//! A key is built from syntax alone: the member's name, its type-parameter
//! count, and each parameter's passing mode and normalized type text.
//! Method type parameters are replaced by their position, so
//! `void M<T>(T x)` and `void M<U>(U y)` get the same key. Keyword types
//! and their `System` spellings are not unified.

use rsharp_syntax::{NodeId, NodeKind, ParameterModifier, SyntaxTree};

/// Append the normalized text of a type node, with method type
/// parameters replaced by `!!index`.
fn write_type(tree: &SyntaxTree, node: NodeId, method_type_parameters: &[String], out: &mut String) {
    match tree.kind(node) {
        NodeKind::NamedType { alias: None, segments }
            if segments.len() == 1 && segments[0].type_arguments.is_empty() =>
        {
            let name = tree.ident_text(segments[0].name);
            match method_type_parameters.iter().position(|p| p == name) {
                Some(index) => {
                    out.push_str("!!");
                    out.push_str(&index.to_string());
                }
                None => out.push_str(name),
            }
        }
        NodeKind::NamedType { alias, segments } => {
            if alias.is_some() {
                out.push_str(tree.ident_text(*alias));
                out.push_str("::");
            }
            for (i, segment) in segments.iter().enumerate() {
                if i > 0 {
                    out.push('.');
                }
                out.push_str(tree.ident_text(segment.name));
                if !segment.type_arguments.is_empty() {
                    out.push('<');
                    for (j, &argument) in segment.type_arguments.iter().enumerate() {
                        if j > 0 {
                            out.push(',');
                        }
                        write_type(tree, argument, method_type_parameters, out);
                    }
                    out.push('>');
                }
            }
        }
        NodeKind::NullableType { element } => {
            write_type(tree, *element, method_type_parameters, out);
            out.push('?');
        }
        NodeKind::PointerType { element } => {
            write_type(tree, *element, method_type_parameters, out);
            out.push('*');
        }
        NodeKind::ArrayType { element, ranks } => {
            write_type(tree, *element, method_type_parameters, out);
            for rank in ranks {
                out.push('[');
                for _ in 1..*rank {
                    out.push(',');
                }
                out.push(']');
            }
        }
        _ => out.push_str(&tree.type_text(node)),
    }
}

/// The signature key of a member with the given name, type parameters and
/// parameter nodes.
pub fn signature_key(tree: &SyntaxTree, name: &str, type_parameters: &[String], parameters: &[NodeId]) -> String {
    let mut key = String::from(name);
    if !type_parameters.is_empty() {
        key.push_str(&format!("`{}", type_parameters.len()));
    }
    key.push('(');
    for (i, &parameter) in parameters.iter().enumerate() {
        if i > 0 {
            key.push(',');
        }
        let NodeKind::Parameter(param) = tree.kind(parameter) else {
            continue;
        };
        // ref, out and in differ from by-value passing but not from each other.
        if matches!(
            param.modifier,
            ParameterModifier::Ref | ParameterModifier::Out | ParameterModifier::In
        ) {
            key.push_str("ref ");
        }
        match param.ty {
            Some(ty) => write_type(tree, ty, type_parameters, &mut key),
            None => key.push('?'),
        }
    }
    key.push(')');
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsharp_parser::parse_text;

    fn method_keys(source: &str) -> Vec<String> {
        let result = parse_text("t.cs", source, std::iter::empty::<&str>()).unwrap();
        let tree = result.tree;
        tree.descendants(tree.root)
            .into_iter()
            .filter_map(|id| match tree.kind(id) {
                NodeKind::MethodDeclaration(m) => {
                    let type_parameters: Vec<String> = m
                        .type_parameters
                        .iter()
                        .map(|&p| tree.ident_text(tree.kind(p).declared_name()).to_string())
                        .collect();
                    Some(signature_key(&tree, tree.ident_text(m.name), &type_parameters, &m.parameters))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_method_type_parameters_are_positional() {
        let keys = method_keys("class C { void M<T>(T x, List<T> y) {} void M<U>(U a, List<U> b) {} }");
        assert_eq!(keys[0], "M`1(!!0,List<!!0>)");
        assert_eq!(keys[0], keys[1]);
    }

    #[test]
    fn test_passing_modes() {
        let keys = method_keys("class C { void M(ref int x) {} void M(out int x) {} void M(int x) {} void M(params int[] x) {} }");
        assert_eq!(keys[0], "M(ref int)");
        assert_eq!(keys[0], keys[1]);
        assert_eq!(keys[2], "M(int)");
        assert_eq!(keys[3], "M(int[])");
    }

    #[test]
    fn test_keyword_and_system_names_differ() {
        let keys = method_keys("class C { void M(int x) {} void M(System.Int32 x) {} }");
        assert_ne!(keys[0], keys[1]);
    }
}
