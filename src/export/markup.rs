//! XML card database
//!
//! Layout:
//!
//! ```text
//! <wmrh_carddatabase xsi:schemaLocation="urn:..." version="1">
//!   <info> author, createdAt, sourceUrl </info>
//!   <sets> <set> code, name, release_date? </set>* </sets>
//!   <cards> <card>...</card>* </cards>
//!   <tokens> <card>...</card>* </tokens>?
//! </wmrh_carddatabase>
//! ```
//!
//! Card children follow `NormalizedCard` field order. Absent fields and
//! empty lists produce no element at all.

use super::xml_tree::XmlNode;
use super::{CardDatabaseDocument, Emitter};
use crate::core::{
    CardSet, CostValue, ExportMetadata, NameList, NormalizedCard, Ruling, RulingReference, SetInfo,
};
use crate::{ExportError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

pub const ROOT_ELEMENT: &str = "wmrh_carddatabase";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Wrapper element and per-value child for each name list
const NAME_LISTS: [(&str, &str); 3] = [
    ("types", "type"),
    ("clans", "clan"),
    ("disciplines", "discipline"),
];

pub struct MarkupEmitter {
    /// Schema URL advertised in `xsi:schemaLocation`
    pub schema_location: String,
}

impl MarkupEmitter {
    pub fn new(schema_location: impl Into<String>) -> Self {
        MarkupEmitter {
            schema_location: schema_location.into(),
        }
    }
}

impl Emitter for MarkupEmitter {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn emit(&self, doc: &CardDatabaseDocument) -> Result<Vec<u8>> {
        let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
        w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let schema_location = format!("urn:{}", self.schema_location);
        let root = BytesStart::new(ROOT_ELEMENT).with_attributes([
            ("xmlns:xsi", XSI_NAMESPACE),
            ("xsi:schemaLocation", schema_location.as_str()),
            ("version", doc.info.format_version.as_str()),
        ]);
        w.write_event(Event::Start(root))?;

        start(&mut w, "info")?;
        text_element(&mut w, "author", &doc.info.author)?;
        text_element(&mut w, "createdAt", &doc.info.created_at)?;
        text_element(&mut w, "sourceUrl", &doc.info.source_url)?;
        end(&mut w, "info")?;

        start(&mut w, "sets")?;
        for set in &doc.sets {
            start(&mut w, "set")?;
            text_element(&mut w, "code", &set.code)?;
            text_element(&mut w, "name", &set.name)?;
            if let Some(date) = &set.release_date {
                text_element(&mut w, "release_date", date)?;
            }
            end(&mut w, "set")?;
        }
        end(&mut w, "sets")?;

        write_card_list(&mut w, "cards", &doc.cards)?;
        if !doc.tokens.is_empty() {
            write_card_list(&mut w, "tokens", &doc.tokens)?;
        }

        end(&mut w, ROOT_ELEMENT)?;

        let mut bytes = w.into_inner();
        bytes.push(b'\n');
        Ok(bytes)
    }
}

type XmlWriter = Writer<Vec<u8>>;

fn start(w: &mut XmlWriter, name: &str) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    Ok(())
}

fn end(w: &mut XmlWriter, name: &str) -> Result<()> {
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn text_element(w: &mut XmlWriter, name: &str, text: &str) -> Result<()> {
    if text.is_empty() {
        w.write_event(Event::Empty(BytesStart::new(name)))?;
        return Ok(());
    }
    start(w, name)?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    end(w, name)
}

fn write_card_list(w: &mut XmlWriter, section: &str, cards: &[NormalizedCard]) -> Result<()> {
    start(w, section)?;
    for card in cards {
        write_card(w, card)?;
    }
    end(w, section)
}

fn write_card(w: &mut XmlWriter, card: &NormalizedCard) -> Result<()> {
    start(w, "card")?;

    if let Some(id) = card.id {
        text_element(w, "id", &id.to_string())?;
    }
    text_element(w, "name", &card.name)?;
    if let Some(printed) = &card.printed_name {
        text_element(w, "printed_name", printed)?;
    }
    if let Some(url) = &card.url {
        text_element(w, "url", url)?;
    }

    let lists = [&card.types, &card.clans, &card.disciplines];
    for ((wrapper, item), values) in NAME_LISTS.iter().zip(lists) {
        if values.is_empty() {
            continue;
        }
        start(w, wrapper)?;
        for value in values.iter() {
            text_element(w, item, value)?;
        }
        end(w, wrapper)?;
    }

    if let Some(group) = card.group {
        text_element(w, "group", &group.to_string())?;
    }
    if let Some(capacity) = card.capacity {
        text_element(w, "capacity", &capacity.to_string())?;
    }
    if let Some(cost) = &card.pool_cost {
        text_element(w, "pool_cost", &cost.to_string())?;
    }
    if let Some(cost) = &card.blood_cost {
        text_element(w, "blood_cost", &cost.to_string())?;
    }
    if let Some(banned) = &card.banned {
        text_element(w, "banned", banned)?;
    }
    text_element(w, "is_crypt", bool_text(card.is_crypt))?;
    text_element(w, "is_token", bool_text(card.is_token))?;
    if let Some(text) = &card.text {
        text_element(w, "text", text)?;
    }

    if !card.sets.is_empty() {
        start(w, "sets")?;
        for set in &card.sets {
            let elem = BytesStart::new("set")
                .with_attributes([("name", set.name.as_str()), ("picURL", set.pic_url.as_str())]);
            w.write_event(Event::Empty(elem))?;
        }
        end(w, "sets")?;
    }

    if !card.rulings.is_empty() {
        start(w, "rulings")?;
        for ruling in &card.rulings {
            start(w, "ruling")?;
            text_element(w, "text", &ruling.text)?;
            for reference in &ruling.references {
                let elem = BytesStart::new("link").with_attributes([("tag", reference.label.as_str())]);
                w.write_event(Event::Start(elem))?;
                w.write_event(Event::Text(BytesText::new(&reference.url)))?;
                end(w, "link")?;
            }
            end(w, "ruling")?;
        }
        end(w, "rulings")?;
    }

    end(w, "card")
}

fn bool_text(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Read a document written by [`MarkupEmitter`]
pub fn from_xml(bytes: &[u8]) -> Result<CardDatabaseDocument> {
    let root = XmlNode::parse(bytes)?;
    if root.name != ROOT_ELEMENT {
        return Err(ExportError::InvalidXml(format!(
            "expected <{ROOT_ELEMENT}> root, found <{}>",
            root.name
        )));
    }

    let info = root
        .child("info")
        .ok_or_else(|| missing("info", ROOT_ELEMENT))?;
    let info = ExportMetadata {
        author: required_text(info, "author")?,
        created_at: required_text(info, "createdAt")?,
        source_url: required_text(info, "sourceUrl")?,
        format_version: root.attr("version").unwrap_or_default().to_string(),
    };

    let sets = match root.child("sets") {
        Some(sets) => sets
            .children_named("set")
            .map(|set| {
                Ok(SetInfo {
                    code: required_text(set, "code")?,
                    name: required_text(set, "name")?,
                    release_date: set.child_text("release_date").map(str::to_string),
                })
            })
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    Ok(CardDatabaseDocument {
        info,
        sets,
        cards: read_card_list(root.child("cards"))?,
        tokens: read_card_list(root.child("tokens"))?,
    })
}

fn read_card_list(section: Option<&XmlNode>) -> Result<Vec<NormalizedCard>> {
    match section {
        Some(section) => section.children_named("card").map(read_card).collect(),
        None => Ok(Vec::new()),
    }
}

fn read_card(node: &XmlNode) -> Result<NormalizedCard> {
    let name = required_text(node, "name")?;

    let mut lists: [NameList; 3] = Default::default();
    for ((wrapper, item), list) in NAME_LISTS.iter().zip(lists.iter_mut()) {
        if let Some(wrapper) = node.child(wrapper) {
            list.extend(wrapper.children_named(item).map(|c| c.text.clone()));
        }
    }
    let [types, clans, disciplines] = lists;

    let mut card = NormalizedCard::new(name, types);
    card.clans = clans;
    card.disciplines = disciplines;
    card.id = optional_number(node, "id")?;
    card.printed_name = node.child_text("printed_name").map(str::to_string);
    card.url = node.child_text("url").map(str::to_string);
    card.group = optional_number(node, "group")?;
    card.capacity = optional_number(node, "capacity")?;
    card.pool_cost = node.child_text("pool_cost").map(CostValue::parse);
    card.blood_cost = node.child_text("blood_cost").map(CostValue::parse);
    card.banned = node.child_text("banned").map(str::to_string);
    card.is_crypt = read_bool(node, "is_crypt")?.unwrap_or(card.is_crypt);
    card.is_token = read_bool(node, "is_token")?.unwrap_or(false);
    card.text = node.child_text("text").map(str::to_string);

    if let Some(sets) = node.child("sets") {
        card.sets = sets
            .children_named("set")
            .map(|set| {
                Ok(CardSet {
                    name: required_attr(set, "name")?,
                    pic_url: required_attr(set, "picURL")?,
                })
            })
            .collect::<Result<_>>()?;
    }

    if let Some(rulings) = node.child("rulings") {
        card.rulings = rulings
            .children_named("ruling")
            .map(|ruling| {
                let references = ruling
                    .children_named("link")
                    .map(|link| {
                        Ok(RulingReference {
                            label: required_attr(link, "tag")?,
                            url: link.text.clone(),
                        })
                    })
                    .collect::<Result<_>>()?;
                Ok(Ruling {
                    text: ruling.child_text("text").unwrap_or_default().to_string(),
                    references,
                })
            })
            .collect::<Result<_>>()?;
    }

    Ok(card)
}

fn missing(what: &str, parent: &str) -> ExportError {
    ExportError::InvalidXml(format!("<{parent}> is missing <{what}>"))
}

fn required_text(node: &XmlNode, name: &str) -> Result<String> {
    node.child_text(name)
        .map(str::to_string)
        .ok_or_else(|| missing(name, &node.name))
}

fn required_attr(node: &XmlNode, key: &str) -> Result<String> {
    node.attr(key).map(str::to_string).ok_or_else(|| {
        ExportError::InvalidXml(format!("<{}> is missing attribute '{key}'", node.name))
    })
}

fn optional_number(node: &XmlNode, name: &str) -> Result<Option<u32>> {
    node.child_text(name)
        .map(|text| {
            text.trim().parse::<u32>().map_err(|_| {
                ExportError::InvalidXml(format!("<{name}> is not a number: '{text}'"))
            })
        })
        .transpose()
}

fn read_bool(node: &XmlNode, name: &str) -> Result<Option<bool>> {
    node.child_text(name)
        .map(|text| match text.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(ExportError::InvalidXml(format!(
                "<{name}> is not a boolean: '{other}'"
            ))),
        })
        .transpose()
}
