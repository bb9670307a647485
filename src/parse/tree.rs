use std::borrow::Cow;

use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::parse::error::DecodeError;

/// One element of the generic structural tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub tag: String,
    /// Attributes in document order
    pub attrs: IndexMap<String, String>,
    /// Child elements and text, in document order
    pub content: Vec<Content>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Element(Node),
    Text(String),
}

impl Node {
    pub fn new(tag: impl Into<String>) -> Self {
        Node {
            tag: tag.into(),
            attrs: IndexMap::new(),
            content: Vec::new(),
        }
    }

    /// Child elements, skipping text
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.content.iter().filter_map(|c| match c {
            Content::Element(node) => Some(node),
            Content::Text(_) => None,
        })
    }

    /// All child elements with the given tag, in order
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children().filter(move |n| n.tag == tag)
    }

    /// First child element with the given tag
    pub fn child(&self, tag: &str) -> Option<&Node> {
        self.children().find(|n| n.tag == tag)
    }

    /// Follow a slash-separated path of child tags, taking the first match at
    /// each step. An empty path is the node itself.
    pub fn find(&self, path: &str) -> Option<&Node> {
        path.split('/')
            .filter(|step| !step.is_empty())
            .try_fold(self, |node, step| node.child(step))
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// The `Value` attribute, where Live keeps almost every scalar
    pub fn value(&self) -> Option<&str> {
        self.attr("Value")
    }

    /// `Value` attribute of the node at `path`
    pub fn value_at(&self, path: &str) -> Option<&str> {
        self.find(path).and_then(Node::value)
    }

    /// All descendant elements in document (preorder) order, excluding self
    pub fn descendants(&self) -> Descendants<'_> {
        let mut stack: Vec<&Node> = self.children().collect();
        stack.reverse();
        Descendants { stack }
    }

    /// First descendant with the given tag
    pub fn find_descendant(&self, tag: &str) -> Option<&Node> {
        self.descendants().find(|n| n.tag == tag)
    }

    /// Concatenated text content of this node (not descendants)
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                Content::Text(t) => Some(t.as_str()),
                Content::Element(_) => None,
            })
            .collect()
    }
}

/// Preorder iterator over a node's descendants
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let node = self.stack.pop()?;
        let start = self.stack.len();
        self.stack.extend(node.children());
        self.stack[start..].reverse();
        Some(node)
    }
}

/// Parse a decompressed XML byte stream into a generic tree.
pub fn parse_tree(bytes: &[u8]) -> Result<Node, DecodeError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        let position = reader.buffer_position() as u64;
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| DecodeError::malformed(position, e.to_string()))?;

        match event {
            Event::Start(ref e) => {
                let node = open_node(e, position)?;
                if root.is_some() && stack.is_empty() {
                    return Err(DecodeError::malformed(position, "multiple root elements"));
                }
                stack.push(node);
            }
            Event::Empty(ref e) => {
                let node = open_node(e, position)?;
                attach(node, &mut stack, &mut root, position)?;
            }
            Event::End(_) => {
                // quick-xml has already checked that the end tag matches
                let node = stack
                    .pop()
                    .ok_or_else(|| DecodeError::malformed(position, "unexpected end tag"))?;
                attach(node, &mut stack, &mut root, position)?;
            }
            Event::Text(ref e) => {
                let text = e
                    .unescape()
                    .map_err(|err| DecodeError::malformed(position, err.to_string()))?;
                push_text(&mut stack, text);
            }
            Event::CData(e) => {
                let raw = e.into_inner();
                let text = std::str::from_utf8(&raw)
                    .map_err(|err| DecodeError::malformed(position, err.to_string()))?;
                push_text(&mut stack, Cow::Borrowed(text));
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctypes
            _ => {}
        }
        buf.clear();
    }

    let end = reader.buffer_position() as u64;
    if let Some(open) = stack.last() {
        return Err(DecodeError::malformed(
            end,
            format!("unterminated element <{}>", open.tag),
        ));
    }
    root.ok_or_else(|| DecodeError::malformed(end, "document has no root element"))
}

fn open_node(start: &BytesStart<'_>, position: u64) -> Result<Node, DecodeError> {
    let tag = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| DecodeError::malformed(position, format!("invalid tag name: {}", e)))?
        .to_string();
    let mut node = Node::new(tag);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| DecodeError::malformed(position, e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| DecodeError::malformed(position, format!("invalid attribute name: {}", e)))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| DecodeError::malformed(position, e.to_string()))?
            .into_owned();
        node.attrs.insert(key, value);
    }
    Ok(node)
}

fn attach(
    node: Node,
    stack: &mut [Node],
    root: &mut Option<Node>,
    position: u64,
) -> Result<(), DecodeError> {
    match stack.last_mut() {
        Some(parent) => parent.content.push(Content::Element(node)),
        None if root.is_none() => *root = Some(node),
        None => return Err(DecodeError::malformed(position, "multiple root elements")),
    }
    Ok(())
}

fn push_text(stack: &mut [Node], text: Cow<'_, str>) {
    if text.is_empty() {
        return;
    }
    // Text outside the root element is ignored
    if let Some(parent) = stack.last_mut() {
        parent.content.push(Content::Text(text.into_owned()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_elements_and_attributes() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
<Ableton MajorVersion="5" Creator="Ableton Live 11.3">
  <LiveSet>
    <Tracks>
      <AudioTrack Id="8"><Name><EffectiveName Value="Bass &amp; Sub" /></Name></AudioTrack>
      <MidiTrack Id="9" />
    </Tracks>
  </LiveSet>
</Ableton>"#;
        let root = parse_tree(xml).unwrap();
        assert_eq!(root.tag, "Ableton");
        assert_eq!(root.attr("Creator"), Some("Ableton Live 11.3"));
        let attr_names: Vec<&str> = root.attrs.keys().map(String::as_str).collect();
        assert_eq!(attr_names, vec!["MajorVersion", "Creator"]);

        let tracks = root.find("LiveSet/Tracks").unwrap();
        let tags: Vec<&str> = tracks.children().map(|n| n.tag.as_str()).collect();
        assert_eq!(tags, vec!["AudioTrack", "MidiTrack"]);
        assert_eq!(
            tracks.value_at("AudioTrack/Name/EffectiveName"),
            Some("Bass & Sub")
        );
    }

    #[test]
    fn test_repeated_tags_are_kept_in_order() {
        let xml = br#"<Root><Item Value="1"/><Other/><Item Value="2"/><Item Value="3"/></Root>"#;
        let root = parse_tree(xml).unwrap();
        let values: Vec<&str> = root.children_named("Item").filter_map(Node::value).collect();
        assert_eq!(values, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_missing_paths_yield_none() {
        let root = parse_tree(b"<Root><A><B Value=\"x\"/></A></Root>").unwrap();
        assert!(root.find("A/C").is_none());
        assert!(root.value_at("A/B/C").is_none());
        assert!(root.find("A").unwrap().value().is_none());
        assert_eq!(root.find("").map(|n| n.tag.as_str()), Some("Root"));
    }

    #[test]
    fn test_text_content_preserved() {
        let root = parse_tree(b"<Root>hello <![CDATA[<raw>]]><B/>world</Root>").unwrap();
        assert_eq!(root.text(), "hello<raw>world");
        assert_eq!(root.content.len(), 4);
    }

    #[test]
    fn test_descendants_are_preorder() {
        let root = parse_tree(b"<R><A><B/><C/></A><D><E/></D></R>").unwrap();
        let tags: Vec<&str> = root.descendants().map(|n| n.tag.as_str()).collect();
        assert_eq!(tags, vec!["A", "B", "C", "D", "E"]);
        assert_eq!(root.find_descendant("E").map(|n| n.tag.as_str()), Some("E"));
    }

    #[test]
    fn test_unterminated_element_is_malformed() {
        assert!(matches!(
            parse_tree(b"<Ableton><LiveSet>"),
            Err(DecodeError::MalformedStructure { .. })
        ));
    }

    #[test]
    fn test_mismatched_end_tag_is_malformed() {
        assert!(matches!(
            parse_tree(b"<A><B></A></B>"),
            Err(DecodeError::MalformedStructure { .. })
        ));
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        assert!(matches!(
            parse_tree(b"<A Name=\"\xff\xfe\"/>"),
            Err(DecodeError::MalformedStructure { .. })
        ));
    }

    #[test]
    fn test_empty_document_is_malformed() {
        assert!(matches!(
            parse_tree(b"<?xml version=\"1.0\"?>"),
            Err(DecodeError::MalformedStructure { .. })
        ));
        assert!(matches!(
            parse_tree(b"<A/><B/>"),
            Err(DecodeError::MalformedStructure { .. })
        ));
    }
}
