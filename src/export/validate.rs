//! XML Schema validation
//!
//! Covers the part of XSD that card database schemas use: global and
//! local element declarations, named and inline complex types, `ref=`,
//! `sequence`/`choice`/`all` with occurrence bounds, `any`, attribute
//! declarations and text-only content. Built-in simple types are checked
//! for integers and booleans; every other simple type accepts any text.
//!
//! Content models are matched greedily, without backtracking. That is
//! exact for deterministic content models, which XSD's Unique Particle
//! Attribution rule requires of every valid schema; a non-deterministic
//! model may be reported as a mismatch. This is not a general-purpose
//! validator.

use super::xml_tree::XmlNode;
use crate::{ExportError, Result};
use rustc_hash::FxHashMap;
use std::fmt;

/// One place where a document departs from its schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Element path, e.g. `/wmrh_carddatabase/cards/card[2]/group`
    pub path: String,
    pub message: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimpleKind {
    Text,
    Integer,
    NonNegativeInteger,
    Boolean,
}

impl SimpleKind {
    fn builtin(name: &str) -> Self {
        match name {
            "integer" | "int" | "long" | "short" | "byte" => SimpleKind::Integer,
            "nonNegativeInteger" | "positiveInteger" | "unsignedInt" | "unsignedLong"
            | "unsignedShort" | "unsignedByte" => SimpleKind::NonNegativeInteger,
            "boolean" => SimpleKind::Boolean,
            _ => SimpleKind::Text,
        }
    }

    fn accepts(self, text: &str) -> bool {
        let text = text.trim();
        match self {
            SimpleKind::Text => true,
            SimpleKind::Integer => text.parse::<i64>().is_ok(),
            SimpleKind::NonNegativeInteger => text.parse::<u64>().is_ok(),
            SimpleKind::Boolean => matches!(text, "true" | "false" | "1" | "0"),
        }
    }
}

#[derive(Debug, Clone)]
enum ElementContent {
    /// No type given: anything goes
    Any,
    /// `type="..."`, resolved at validation time
    Named(String),
    Simple(SimpleKind),
    Complex(Box<ComplexType>),
}

#[derive(Debug, Clone)]
struct ElementDecl {
    name: String,
    reference: Option<String>,
    min: u32,
    /// `None` is unbounded
    max: Option<u32>,
    content: ElementContent,
}

#[derive(Debug, Clone)]
struct AttributeDecl {
    name: String,
    required: bool,
}

#[derive(Debug, Clone, Default)]
struct ComplexType {
    particle: Option<Particle>,
    attributes: Vec<AttributeDecl>,
    any_attribute: bool,
    mixed: bool,
    /// Set for `simpleContent`: text of this kind, no child elements
    text_only: Option<SimpleKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    Sequence,
    Choice,
    All,
}

#[derive(Debug, Clone)]
enum Particle {
    Element(ElementDecl),
    Group {
        kind: GroupKind,
        items: Vec<Particle>,
        min: u32,
        max: Option<u32>,
    },
    Any {
        min: u32,
        max: Option<u32>,
    },
}

impl Particle {
    fn bounds(&self) -> (u32, Option<u32>) {
        match self {
            Particle::Element(decl) => (decl.min, decl.max),
            Particle::Group { min, max, .. } | Particle::Any { min, max } => (*min, *max),
        }
    }

    fn describe(&self) -> String {
        match self {
            Particle::Element(decl) => decl.reference.as_deref().unwrap_or(&decl.name).to_string(),
            Particle::Any { .. } => "any".to_string(),
            Particle::Group { kind, items, .. } => {
                let sep = match kind {
                    GroupKind::Sequence => ", ",
                    GroupKind::Choice => " | ",
                    GroupKind::All => " & ",
                };
                let inner: Vec<String> = items.iter().map(Particle::describe).collect();
                format!("({})", inner.join(sep))
            }
        }
    }
}

/// Parsed schema document
#[derive(Debug, Clone, Default)]
pub struct XsdSchema {
    elements: FxHashMap<String, ElementDecl>,
    complex_types: FxHashMap<String, ComplexType>,
    simple_types: FxHashMap<String, SimpleKind>,
}

fn local(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn invalid(message: impl Into<String>) -> ExportError {
    ExportError::SchemaInvalid(message.into())
}

fn occurs(node: &XmlNode) -> Result<(u32, Option<u32>)> {
    let min = match node.attr("minOccurs") {
        Some(v) => v
            .parse()
            .map_err(|_| invalid(format!("bad minOccurs '{v}'")))?,
        None => 1,
    };
    let max = match node.attr("maxOccurs") {
        Some("unbounded") => None,
        Some(v) => Some(
            v.parse()
                .map_err(|_| invalid(format!("bad maxOccurs '{v}'")))?,
        ),
        None => Some(1),
    };
    Ok((min, max))
}

impl XsdSchema {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let root = XmlNode::parse(bytes).map_err(|e| invalid(e.to_string()))?;
        if root.name != "schema" {
            return Err(invalid(format!("expected <schema> root, found <{}>", root.name)));
        }

        let mut schema = XsdSchema::default();
        for child in &root.children {
            match child.name.as_str() {
                "element" => {
                    let decl = Self::parse_element(child)?;
                    schema.elements.insert(decl.name.clone(), decl);
                }
                "complexType" => {
                    let name = child
                        .attr("name")
                        .ok_or_else(|| invalid("global complexType without a name"))?;
                    schema
                        .complex_types
                        .insert(name.to_string(), Self::parse_complex(child)?);
                }
                "simpleType" => {
                    let name = child
                        .attr("name")
                        .ok_or_else(|| invalid("global simpleType without a name"))?;
                    schema
                        .simple_types
                        .insert(name.to_string(), Self::parse_simple(child));
                }
                _ => {}
            }
        }

        if schema.elements.is_empty() {
            return Err(invalid("schema declares no global elements"));
        }
        Ok(schema)
    }

    fn parse_element(node: &XmlNode) -> Result<ElementDecl> {
        let (min, max) = occurs(node)?;
        let reference = node.attr("ref").map(|r| local(r).to_string());
        let name = match (node.attr("name"), &reference) {
            (Some(name), _) => name.to_string(),
            (None, Some(reference)) => reference.clone(),
            (None, None) => return Err(invalid("element without name or ref")),
        };

        let content = if let Some(type_name) = node.attr("type") {
            ElementContent::Named(type_name.to_string())
        } else if let Some(complex) = node.child("complexType") {
            ElementContent::Complex(Box::new(Self::parse_complex(complex)?))
        } else if let Some(simple) = node.child("simpleType") {
            ElementContent::Simple(Self::parse_simple(simple))
        } else {
            ElementContent::Any
        };

        Ok(ElementDecl {
            name,
            reference,
            min,
            max,
            content,
        })
    }

    fn parse_simple(node: &XmlNode) -> SimpleKind {
        node.child("restriction")
            .and_then(|r| r.attr("base"))
            .map(|base| SimpleKind::builtin(local(base)))
            .unwrap_or(SimpleKind::Text)
    }

    fn parse_complex(node: &XmlNode) -> Result<ComplexType> {
        let mut ct = ComplexType {
            mixed: node.attr("mixed") == Some("true"),
            ..ComplexType::default()
        };
        Self::parse_attributes(node, &mut ct);

        for child in &node.children {
            match child.name.as_str() {
                "sequence" | "choice" | "all" => ct.particle = Some(Self::parse_particle(child)?),
                "simpleContent" => {
                    let derivation = child
                        .children
                        .iter()
                        .find(|c| c.name == "extension" || c.name == "restriction")
                        .ok_or_else(|| invalid("simpleContent without extension"))?;
                    let base = derivation.attr("base").map(local).unwrap_or("string");
                    ct.text_only = Some(SimpleKind::builtin(base));
                    Self::parse_attributes(derivation, &mut ct);
                }
                "complexContent" => return Err(invalid("complexContent is not supported")),
                _ => {}
            }
        }
        Ok(ct)
    }

    fn parse_attributes(node: &XmlNode, ct: &mut ComplexType) {
        for attr in node.children_named("attribute") {
            if let Some(name) = attr.attr("name").or_else(|| attr.attr("ref")) {
                ct.attributes.push(AttributeDecl {
                    name: local(name).to_string(),
                    required: attr.attr("use") == Some("required"),
                });
            }
        }
        if node.child("anyAttribute").is_some() {
            ct.any_attribute = true;
        }
    }

    fn parse_particle(node: &XmlNode) -> Result<Particle> {
        let (min, max) = occurs(node)?;
        let kind = match node.name.as_str() {
            "element" => return Ok(Particle::Element(Self::parse_element(node)?)),
            "any" => return Ok(Particle::Any { min, max }),
            "sequence" => GroupKind::Sequence,
            "choice" => GroupKind::Choice,
            "all" => GroupKind::All,
            other => return Err(invalid(format!("unsupported particle <{other}>"))),
        };
        let items = node
            .children
            .iter()
            .filter(|c| c.name != "annotation")
            .map(Self::parse_particle)
            .collect::<Result<Vec<_>>>()?;
        Ok(Particle::Group {
            kind,
            items,
            min,
            max,
        })
    }

    /// Validate a parsed document, returning every violation found
    pub fn validate(&self, root: &XmlNode) -> Vec<SchemaViolation> {
        let mut out = Vec::new();
        let path = format!("/{}", root.name);
        match self.elements.get(&root.name) {
            Some(decl) => self.validate_element(decl, root, &path, &mut out),
            None => out.push(SchemaViolation {
                path,
                message: format!("no global declaration for <{}>", root.name),
            }),
        }
        out
    }

    /// Parse and validate a serialized document
    pub fn validate_bytes(&self, xml: &[u8]) -> Result<Vec<SchemaViolation>> {
        let root = XmlNode::parse(xml)?;
        Ok(self.validate(&root))
    }

    fn resolve<'s>(&'s self, decl: &'s ElementDecl) -> Option<&'s ElementDecl> {
        match &decl.reference {
            Some(reference) => self.elements.get(reference),
            None => Some(decl),
        }
    }

    fn validate_element(
        &self,
        decl: &ElementDecl,
        node: &XmlNode,
        path: &str,
        out: &mut Vec<SchemaViolation>,
    ) {
        let Some(decl) = self.resolve(decl) else {
            out.push(violation(path, format!("unresolved element reference '{}'", decl.name)));
            return;
        };

        match &decl.content {
            ElementContent::Any => {}
            ElementContent::Simple(kind) => check_simple(*kind, node, path, out),
            ElementContent::Complex(ct) => self.validate_complex(ct, node, path, out),
            ElementContent::Named(type_name) => {
                let name = local(type_name);
                if let Some(ct) = self.complex_types.get(name) {
                    self.validate_complex(ct, node, path, out);
                } else {
                    let kind = self
                        .simple_types
                        .get(name)
                        .copied()
                        .unwrap_or_else(|| SimpleKind::builtin(name));
                    check_simple(kind, node, path, out);
                }
            }
        }
    }

    fn validate_complex(
        &self,
        ct: &ComplexType,
        node: &XmlNode,
        path: &str,
        out: &mut Vec<SchemaViolation>,
    ) {
        for attr in &ct.attributes {
            if attr.required && node.attr(&attr.name).is_none() {
                out.push(violation(path, format!("missing required attribute '{}'", attr.name)));
            }
        }
        if !ct.any_attribute {
            for (key, _) in &node.attributes {
                if is_namespace_attribute(key) {
                    continue;
                }
                if !ct.attributes.iter().any(|a| a.name == local(key)) {
                    out.push(violation(path, format!("undeclared attribute '{key}'")));
                }
            }
        }

        if let Some(kind) = ct.text_only {
            if !node.children.is_empty() {
                out.push(violation(path, "element must not have child elements"));
            } else if !kind.accepts(&node.text) {
                out.push(violation(path, format!("invalid value '{}'", node.text)));
            }
            return;
        }

        if !ct.mixed && !node.text.trim().is_empty() {
            out.push(violation(path, "unexpected text in element-only content"));
        }

        let children: Vec<&XmlNode> = node.children.iter().collect();
        let Some(particle) = &ct.particle else {
            if let Some(first) = children.first() {
                out.push(violation(path, format!("unexpected element <{}>", first.name)));
            }
            return;
        };

        let mut matched = Vec::new();
        match self.match_repeated(particle, &children, 0, &mut matched) {
            Some(end) if end == children.len() => {}
            Some(end) => out.push(violation(
                path,
                format!(
                    "unexpected element <{}>, expected {}",
                    children[end].name,
                    particle.describe()
                ),
            )),
            None => {
                let found: Vec<&str> = children.iter().map(|c| c.name.as_str()).collect();
                out.push(violation(
                    path,
                    format!(
                        "content [{}] does not match {}",
                        found.join(", "),
                        particle.describe()
                    ),
                ));
                return;
            }
        }

        for (index, decl) in matched {
            let child = children[index];
            let child_path = child_path(path, &children, index);
            self.validate_element(decl, child, &child_path, out);
        }
    }

    /// Match a particle within its occurrence bounds; `None` when fewer
    /// than `minOccurs` occurrences match
    fn match_repeated<'s>(
        &'s self,
        particle: &'s Particle,
        children: &[&XmlNode],
        start: usize,
        matched: &mut Vec<(usize, &'s ElementDecl)>,
    ) -> Option<usize> {
        let (min, max) = particle.bounds();
        let mark = matched.len();
        let mut pos = start;
        let mut count = 0u32;

        while max.map_or(true, |max| count < max) {
            match self.match_once(particle, children, pos, matched) {
                Some(next) if next > pos => {
                    pos = next;
                    count += 1;
                }
                // An occurrence that consumes nothing satisfies any minimum
                Some(_) => {
                    count = count.max(min);
                    break;
                }
                None => break,
            }
        }

        if count < min {
            matched.truncate(mark);
            return None;
        }
        Some(pos)
    }

    fn match_once<'s>(
        &'s self,
        particle: &'s Particle,
        children: &[&XmlNode],
        pos: usize,
        matched: &mut Vec<(usize, &'s ElementDecl)>,
    ) -> Option<usize> {
        let mark = matched.len();
        match particle {
            Particle::Element(decl) => {
                let child = children.get(pos)?;
                (child.name == decl.name).then(|| {
                    matched.push((pos, decl));
                    pos + 1
                })
            }
            Particle::Any { .. } => (pos < children.len()).then_some(pos + 1),
            Particle::Group {
                kind: GroupKind::Sequence,
                items,
                ..
            } => {
                let mut p = pos;
                for item in items {
                    match self.match_repeated(item, children, p, matched) {
                        Some(next) => p = next,
                        None => {
                            matched.truncate(mark);
                            return None;
                        }
                    }
                }
                Some(p)
            }
            Particle::Group {
                kind: GroupKind::Choice,
                items,
                ..
            } => {
                let mut empty_ok = false;
                for item in items {
                    match self.match_repeated(item, children, pos, matched) {
                        Some(next) if next > pos => return Some(next),
                        Some(_) => empty_ok = true,
                        None => {}
                    }
                    matched.truncate(mark);
                }
                empty_ok.then_some(pos)
            }
            Particle::Group {
                kind: GroupKind::All,
                items,
                ..
            } => {
                let mut counts = vec![0u32; items.len()];
                let mut p = pos;
                'children: while let Some(child) = children.get(p) {
                    for (i, item) in items.iter().enumerate() {
                        if let Particle::Element(decl) = item {
                            let room = decl.max.map_or(true, |max| counts[i] < max);
                            if room && child.name == decl.name {
                                matched.push((p, decl));
                                counts[i] += 1;
                                p += 1;
                                continue 'children;
                            }
                        }
                    }
                    break;
                }
                let satisfied = items
                    .iter()
                    .zip(&counts)
                    .all(|(item, count)| *count >= item.bounds().0);
                if satisfied {
                    Some(p)
                } else {
                    matched.truncate(mark);
                    None
                }
            }
        }
    }
}

fn violation(path: &str, message: impl Into<String>) -> SchemaViolation {
    SchemaViolation {
        path: path.to_string(),
        message: message.into(),
    }
}

fn is_namespace_attribute(key: &str) -> bool {
    key == "xmlns" || key.starts_with("xmlns:") || key.starts_with("xsi:")
}

fn check_simple(kind: SimpleKind, node: &XmlNode, path: &str, out: &mut Vec<SchemaViolation>) {
    if !node.children.is_empty() {
        out.push(violation(path, "simple-typed element must not have child elements"));
        return;
    }
    for (key, _) in &node.attributes {
        if !is_namespace_attribute(key) {
            out.push(violation(path, format!("undeclared attribute '{key}'")));
        }
    }
    if !kind.accepts(&node.text) {
        out.push(violation(path, format!("invalid value '{}'", node.text)));
    }
}

/// `parent/name[n]`, with `n` counting same-named siblings from 1
fn child_path(parent: &str, children: &[&XmlNode], index: usize) -> String {
    let name = &children[index].name;
    let same = children.iter().filter(|c| &c.name == name).count();
    if same == 1 {
        return format!("{parent}/{name}");
    }
    let n = children[..index].iter().filter(|c| &c.name == name).count() + 1;
    format!("{parent}/{name}[{n}]")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="deck">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="title" type="xs:string"/>
        <xs:element ref="card" minOccurs="0" maxOccurs="unbounded"/>
        <xs:choice minOccurs="0">
          <xs:element name="note" type="xs:string"/>
          <xs:element name="comment" type="xs:string"/>
        </xs:choice>
      </xs:sequence>
      <xs:attribute name="version" use="required"/>
    </xs:complexType>
  </xs:element>
  <xs:element name="card" type="CardType"/>
  <xs:complexType name="CardType">
    <xs:all>
      <xs:element name="name" type="xs:string"/>
      <xs:element name="count" type="xs:nonNegativeInteger" minOccurs="0"/>
    </xs:all>
    <xs:attribute name="id"/>
  </xs:complexType>
</xs:schema>"#;

    fn check(xml: &str) -> Vec<SchemaViolation> {
        let schema = XsdSchema::parse(SCHEMA.as_bytes()).unwrap();
        schema.validate_bytes(xml.as_bytes()).unwrap()
    }

    #[test]
    fn test_valid_document() {
        let violations = check(
            r#"<deck version="1">
  <title>Toreador Party</title>
  <card id="a"><count>2</count><name>Anson</name></card>
  <card><name>Blood Doll</name></card>
  <note>tested</note>
</deck>"#,
        );
        assert!(violations.is_empty(), "{violations:?}");
    }

    #[test]
    fn test_missing_required_parts() {
        let violations = check(r#"<deck><card><count>1</count></card></deck>"#);
        assert!(violations
            .iter()
            .any(|v| v.message.contains("missing required attribute 'version'")));
        assert!(violations
            .iter()
            .any(|v| v.path == "/deck" && v.message.contains("does not match")));
    }

    #[test]
    fn test_bad_values_and_stray_elements() {
        let violations = check(
            r#"<deck version="1">
  <title>x</title>
  <card><name>A</name><count>-1</count></card>
  <card><name>B</name></card>
  <extra/>
</deck>"#,
        );
        let messages: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
        assert!(messages
            .iter()
            .any(|m| m.starts_with("/deck/card[1]/count: invalid value")));
        assert!(messages
            .iter()
            .any(|m| m.starts_with("/deck: unexpected element <extra>")));
    }

    #[test]
    fn test_choice_takes_one_branch() {
        let violations = check(
            r#"<deck version="1"><title>x</title><note>a</note><comment>b</comment></deck>"#,
        );
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("<comment>"));
    }

    #[test]
    fn test_unknown_root_and_bad_schema() {
        let violations = check("<library/>");
        assert_eq!(violations[0].message, "no global declaration for <library>");

        assert!(matches!(
            XsdSchema::parse(b"<notaschema/>"),
            Err(ExportError::SchemaInvalid(_))
        ));
        assert!(matches!(
            XsdSchema::parse(b"<xs:schema xmlns:xs=\"x\"><xs:element"),
            Err(ExportError::SchemaInvalid(_))
        ));
    }
}
