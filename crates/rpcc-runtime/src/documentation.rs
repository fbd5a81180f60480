//! Operation documentation.
//!
//! Structured ([`FunctionDoc`]) and plain-text views of a definition, used
//! by `server_function_definition` and `server_documentation` and
//! available to external documentation generators.

use crate::operation::OperationDefinition;
use rpcc_schema::{DocParameter, TypeDescriptor, TypeDoc, TypeKind};
use rpcc_types::{Value, VersionRange};
use serde::Serialize;
use std::fmt::Write as _;

/// Structured documentation of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDoc {
    pub function: String,
    pub parameters: Vec<DocParameter>,
    pub returns: DocParameter,
    pub types: Vec<TypeDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FunctionDoc {
    #[must_use]
    pub fn new(def: &OperationDefinition) -> Self {
        let parameters = def
            .params()
            .iter()
            .map(|p| {
                DocParameter::new(p.ty().name())
                    .named(p.name())
                    .described(p.description())
            })
            .collect();
        let mut types: Vec<TypeDoc> = def.referenced_types().iter().map(|t| t.doc()).collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            function: def.name().to_string(),
            parameters,
            returns: DocParameter::new(def.returns().name()),
            types,
            description: def.description().map(str::to_string),
        }
    }

    /// Internal value matching the `doc-function` descriptor.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut members = vec![
            ("function", Value::from(self.function.as_str())),
            (
                "parameters",
                Value::List(self.parameters.iter().map(DocParameter::to_value).collect()),
            ),
            ("returns", self.returns.to_value()),
            (
                "types",
                Value::List(self.types.iter().map(TypeDoc::to_value).collect()),
            ),
        ];
        if let Some(description) = &self.description {
            members.push(("description", Value::from(description.as_str())));
        }
        Value::structure(members)
    }
}

fn type_ref(ty: &TypeDescriptor) -> String {
    match ty.kind() {
        TypeKind::Nullable(inner) => format!("{} or <null>", type_ref(inner)),
        TypeKind::List(element) => format!("[{}, ...]", type_ref(element)),
        _ => format!("<{}>", ty.name()),
    }
}

fn type_body(ty: &TypeDescriptor) -> String {
    match ty.kind() {
        TypeKind::String(rules) => {
            let mut out = "String".to_string();
            if let Some(maxlen) = rules.max_len() {
                let _ = write!(out, " of max length {maxlen}");
            }
            if let Some(regexp) = rules.anchored_regexp() {
                let _ = write!(out, " matching regexp '{}'", regexp.replace('\n', "\\n"));
            }
            if rules.max_len().is_none() && rules.anchored_regexp().is_none() {
                out.push_str(" with any content");
            }
            if rules.is_masked() {
                out.push_str(", masked in output");
            }
            out
        }
        TypeKind::Enum(values) => {
            format!("String with content being one of [{}]", values.join(", "))
        }
        TypeKind::Integer(Some((min, max))) => format!("Integer between {min} and {max}"),
        TypeKind::Integer(None) => "Integer".to_string(),
        TypeKind::Boolean => "Boolean".to_string(),
        TypeKind::Null => "Null".to_string(),
        TypeKind::DateTime => "Datetime as YYYY-MM-DDTHH:MM:SS".to_string(),
        TypeKind::List(element) => format!("List of {}", type_ref(element)),
        TypeKind::Nullable(inner) => format!("{} or <null>", type_ref(inner)),
        TypeKind::Struct(members) => {
            let rows: Vec<(String, &TypeDescriptor)> = members
                .mandatory
                .iter()
                .map(|(k, t)| (k.clone(), t.as_ref()))
                .chain(members.optional.iter().map(|(k, t)| (format!("({k})"), t.as_ref())))
                .collect();
            let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
            let mut out = "Struct with keys (optional in parenthesis)".to_string();
            for (key, member) in rows {
                if let Some(desc) = member.description() {
                    let _ = write!(out, "\n      # {desc}");
                }
                let _ = write!(out, "\n      {key:<width$} = {}", type_ref(member));
            }
            out
        }
    }
}

fn synopsis_versions(range: VersionRange) -> String {
    match range.to {
        None => format!("{}-oo", range.from),
        Some(to) if to != range.from => format!("{}-{to}", range.from),
        Some(_) => range.from.to_string(),
    }
}

/// Plain-text documentation of `def`, visible in `versions`.
#[must_use]
pub fn function_as_text(def: &OperationDefinition, versions: VersionRange) -> String {
    let mut doc = String::new();
    let names: Vec<&str> = def.params().iter().map(|p| p.name()).collect();
    let _ = write!(
        doc,
        "Synopsis (API v.{}):\n  {}({})\n",
        synopsis_versions(versions),
        def.name(),
        names.join(", ")
    );

    if let Some(description) = def.description() {
        let _ = write!(doc, "\nDescription:\n{}\n", reflow(description, 2));
    }

    if !def.params().is_empty() {
        doc.push_str("\nParameters:\n");
        let rows: Vec<[String; 3]> = def
            .params()
            .iter()
            .map(|p| {
                let name = if p.is_mandatory() {
                    p.name().to_string()
                } else {
                    format!("({})", p.name())
                };
                [name, type_ref(p.ty()), p.description().unwrap_or_default().to_string()]
            })
            .collect();
        let w0 = rows.iter().map(|r| r[0].len()).max().unwrap_or(0);
        let w1 = rows.iter().map(|r| r[1].len()).max().unwrap_or(0);
        for [name, ty, desc] in rows {
            let line = format!("  {name:<w0$}  {ty:<w1$}  {desc}");
            let _ = writeln!(doc, "{}", line.trim_end());
        }
    }

    let _ = writeln!(doc, "\nReturns: {}", type_ref(def.returns()));

    doc.push_str("\nTypes:\n");
    let mut types = def.referenced_types();
    types.sort_by(|a, b| a.name().cmp(b.name()));
    for ty in types {
        if let Some(desc) = ty.description() {
            let _ = writeln!(doc, "  # {desc}");
        }
        let _ = write!(doc, "  <{}> ::= {}\n\n", ty.name(), type_body(&ty));
    }
    doc
}

/// Re-wraps paragraphs to 78 columns with `indent` leading spaces.
fn reflow(text: &str, indent: usize) -> String {
    let pad = " ".repeat(indent);
    text.split("\n\n")
        .map(|paragraph| {
            let mut lines: Vec<String> = vec![pad.clone()];
            for word in paragraph.split_whitespace() {
                let current = lines.len() - 1;
                if lines[current].len() > indent && lines[current].len() + word.len() + 1 > 78 {
                    lines.push(pad.clone());
                }
                let current = lines.len() - 1;
                if lines[current].len() > indent {
                    lines[current].push(' ');
                }
                lines[current].push_str(word);
            }
            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
