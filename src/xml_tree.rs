use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

/// A node in the parsed XML tree.
///
/// Upstream bureaus disagree on where fields live and whether elements repeat,
/// so the tree is deliberately loose: any tag can hold a scalar, a nested
/// mapping, or an ordered run of either. Extractors pattern-match on this
/// instead of binding to a fixed schema.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlValue {
    /// Text-only element, collapsed to its (trimmed) string content.
    Scalar(String),
    /// Element with children and/or attributes, keyed by lower-cased tag name.
    Node(HashMap<String, XmlValue>),
    /// Repeated same-named siblings, in document order.
    Sequence(Vec<XmlValue>),
}

impl XmlValue {
    /// Returns the scalar content if this is a text-only value.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            XmlValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the child mapping if this is an element node.
    pub fn as_node(&self) -> Option<&HashMap<String, XmlValue>> {
        match self {
            XmlValue::Node(map) => Some(map),
            _ => None,
        }
    }

    /// Views any value as a sequence: a `Sequence` yields its elements,
    /// anything else yields itself as a one-element slice-like iterator.
    pub fn iter_sequence(&self) -> Vec<&XmlValue> {
        match self {
            XmlValue::Sequence(items) => items.iter().collect(),
            other => vec![other],
        }
    }
}

/// The top level of a parsed document: the root element's children.
pub type XmlTree = HashMap<String, XmlValue>;

// One in-flight element while walking the event stream.
struct Frame {
    tag: String,
    children: HashMap<String, XmlValue>,
    text: String,
}

/// Parses a UTF-8 XML document into an [`XmlTree`].
///
/// Normalization applied during the parse:
/// - tag and attribute names are lower-cased and trimmed,
/// - attributes are merged into the element's mapping alongside child tags
///   (same-named attribute and child collide last-write-wins),
/// - repeated same-named children become a [`XmlValue::Sequence`], a single
///   occurrence stays bare,
/// - text-only elements collapse to [`XmlValue::Scalar`],
/// - the document root is unwrapped so the returned tree starts at its children.
///
/// Malformed input (invalid UTF-8, unbalanced tags, empty document) returns
/// the underlying syntax message; no partial tree is ever produced.
pub fn parse_xml_tree(bytes: &[u8]) -> Result<XmlTree, String> {
    let text = std::str::from_utf8(bytes).map_err(|e| format!("invalid UTF-8: {}", e))?;

    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Frame> = vec![Frame {
        tag: String::new(),
        children: HashMap::new(),
        text: String::new(),
    }];

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let mut frame = Frame {
                    tag: normalize_name(start.name().as_ref()),
                    children: HashMap::new(),
                    text: String::new(),
                };
                merge_attributes(&mut frame, start.attributes())?;
                stack.push(frame);
            }
            Ok(Event::Empty(start)) => {
                let mut frame = Frame {
                    tag: normalize_name(start.name().as_ref()),
                    children: HashMap::new(),
                    text: String::new(),
                };
                merge_attributes(&mut frame, start.attributes())?;
                let (tag, value) = close_frame(frame);
                if let Some(parent) = stack.last_mut() {
                    insert_child(&mut parent.children, tag, value);
                }
            }
            Ok(Event::End(_)) => {
                // The reader has already verified the end tag matches.
                let frame = match stack.pop() {
                    Some(f) if !stack.is_empty() => f,
                    _ => return Err("unexpected closing tag".to_string()),
                };
                let (tag, value) = close_frame(frame);
                if let Some(parent) = stack.last_mut() {
                    insert_child(&mut parent.children, tag, value);
                }
            }
            Ok(Event::Text(t)) => {
                let unescaped = t.unescape().map_err(|e| e.to_string())?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&unescaped);
                }
            }
            Ok(Event::CData(cd)) => {
                let raw = cd.into_inner();
                let content =
                    std::str::from_utf8(&raw).map_err(|e| format!("invalid UTF-8: {}", e))?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(content);
                }
            }
            Ok(Event::Decl(_)) | Ok(Event::Comment(_)) | Ok(Event::PI(_)) | Ok(Event::DocType(_)) => {}
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
        }
    }

    if stack.len() != 1 {
        return Err("unexpected end of document: unclosed element".to_string());
    }

    let document = stack.pop().map(|f| f.children).unwrap_or_default();
    if document.is_empty() {
        return Err("document has no root element".to_string());
    }

    // Unwrap the root element so the tree's top level is its children. A
    // text-only root has no children to expose, which leaves an empty tree.
    if document.len() == 1 {
        let root = document.into_values().next();
        return Ok(match root {
            Some(XmlValue::Node(map)) => map,
            _ => HashMap::new(),
        });
    }

    Ok(document)
}

fn normalize_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim().to_lowercase()
}

fn merge_attributes(
    frame: &mut Frame,
    attributes: quick_xml::events::attributes::Attributes<'_>,
) -> Result<(), String> {
    for attr in attributes {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = normalize_name(attr.key.as_ref());
        let value = attr
            .unescape_value()
            .map_err(|e| e.to_string())?
            .trim()
            .to_string();
        // Last write wins on collision with a same-named child tag.
        frame.children.insert(key, XmlValue::Scalar(value));
    }
    Ok(())
}

fn close_frame(frame: Frame) -> (String, XmlValue) {
    let value = if frame.children.is_empty() {
        XmlValue::Scalar(frame.text.trim().to_string())
    } else {
        // Mixed content: children win, interleaved text is dropped.
        XmlValue::Node(frame.children)
    };
    (frame.tag, value)
}

fn insert_child(children: &mut HashMap<String, XmlValue>, tag: String, value: XmlValue) {
    match children.get_mut(&tag) {
        None => {
            children.insert(tag, value);
        }
        Some(XmlValue::Sequence(items)) => items.push(value),
        Some(existing) => {
            let first = std::mem::replace(existing, XmlValue::Sequence(Vec::new()));
            if let XmlValue::Sequence(items) = existing {
                items.push(first);
                items.push(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalar_children_under_root() {
        let tree = parse_xml_tree(b"<report><name>John</name><score>750</score></report>")
            .expect("valid xml");
        assert_eq!(tree.get("name"), Some(&XmlValue::Scalar("John".into())));
        assert_eq!(tree.get("score"), Some(&XmlValue::Scalar("750".into())));
    }

    #[test]
    fn tag_names_are_case_folded() {
        let tree = parse_xml_tree(b"<Report><PersonalInfo><Name>A</Name></PersonalInfo></Report>")
            .expect("valid xml");
        let info = tree.get("personalinfo").and_then(|v| v.as_node()).unwrap();
        assert_eq!(info.get("name"), Some(&XmlValue::Scalar("A".into())));
    }

    #[test]
    fn repeated_children_collapse_to_sequence() {
        let tree = parse_xml_tree(
            b"<r><accounts><account><number>1</number></account><account><number>2</number></account></accounts></r>",
        )
        .expect("valid xml");
        let accounts = tree.get("accounts").and_then(|v| v.as_node()).unwrap();
        match accounts.get("account") {
            Some(XmlValue::Sequence(items)) => assert_eq!(items.len(), 2),
            other => panic!("expected sequence, got {:?}", other),
        }
    }

    #[test]
    fn single_child_stays_bare() {
        let tree = parse_xml_tree(b"<r><accounts><account><number>1</number></account></accounts></r>")
            .expect("valid xml");
        let accounts = tree.get("accounts").and_then(|v| v.as_node()).unwrap();
        assert!(matches!(accounts.get("account"), Some(XmlValue::Node(_))));
    }

    #[test]
    fn attributes_merge_into_the_element() {
        let tree = parse_xml_tree(b"<r><account type=\"credit card\"><number>1</number></account></r>")
            .expect("valid xml");
        let account = tree.get("account").and_then(|v| v.as_node()).unwrap();
        assert_eq!(
            account.get("type"),
            Some(&XmlValue::Scalar("credit card".into()))
        );
        assert_eq!(account.get("number"), Some(&XmlValue::Scalar("1".into())));
    }

    #[test]
    fn text_is_trimmed() {
        let tree = parse_xml_tree(b"<r><name>  John Doe \n </name></r>").expect("valid xml");
        assert_eq!(tree.get("name"), Some(&XmlValue::Scalar("John Doe".into())));
    }

    #[test]
    fn unbalanced_tags_fail() {
        assert!(parse_xml_tree(b"<r><name>John</r>").is_err());
        assert!(parse_xml_tree(b"<r><name>John</name>").is_err());
    }

    #[test]
    fn empty_document_fails() {
        assert!(parse_xml_tree(b"").is_err());
        assert!(parse_xml_tree(b"   ").is_err());
    }

    #[test]
    fn invalid_utf8_fails() {
        assert!(parse_xml_tree(&[0x3c, 0x72, 0x3e, 0xff, 0xfe, 0x3c, 0x2f, 0x72, 0x3e]).is_err());
    }

    #[test]
    fn empty_element_yields_empty_scalar() {
        let tree = parse_xml_tree(b"<r><name/></r>").expect("valid xml");
        assert_eq!(tree.get("name"), Some(&XmlValue::Scalar(String::new())));
    }

    #[test]
    fn cdata_content_is_kept() {
        let tree = parse_xml_tree(b"<r><name><![CDATA[John & Sons]]></name></r>").expect("valid xml");
        assert_eq!(
            tree.get("name"),
            Some(&XmlValue::Scalar("John & Sons".into()))
        );
    }
}
