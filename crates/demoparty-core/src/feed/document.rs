//! Small owned element tree built from the feed with quick-xml.
//!
//! Names are kept exactly as written (`demopartynet:country`), so lookups
//! can match either the prefixed or the local form.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::FeedError;

const XML_DECLARATION: &str = "<?xml";

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    nodes: Vec<XmlNode>,
}

impl XmlElement {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn from_start(start: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Self, FeedError> {
        let mut element = Self::new(String::from_utf8_lossy(start.name().as_ref()));
        for attr in start.attributes() {
            let attr = attr.map_err(|e| FeedError::InvalidDocument(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.decode_and_unescape_value(reader.decoder())?;
            element.attributes.push((key, value.into_owned()));
        }
        Ok(element)
    }

    /// Qualified name, prefix included
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without any namespace prefix
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self) -> impl DoubleEndedIterator<Item = &XmlElement> + '_ {
        self.nodes.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// All elements below this one, in document order
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children().rev().collect(),
        }
    }

    /// Concatenated text of this element and everything below it
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.nodes {
            match node {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(element) => element.collect_text(out),
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(XmlNode::Text(existing)) = self.nodes.last_mut() {
            existing.push_str(text);
        } else {
            self.nodes.push(XmlNode::Text(text.to_string()));
        }
    }
}

/// Part of a possibly prefixed name after the last `:`
pub fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, local)| local).unwrap_or(name)
}

pub struct Descendants<'a> {
    stack: Vec<&'a XmlElement>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children().rev());
        Some(next)
    }
}

fn attach(stack: &mut [XmlElement], element: XmlElement) {
    if let Some(parent) = stack.last_mut() {
        parent.nodes.push(XmlNode::Element(element));
    }
}

/// Parse raw feed text into its root element.
///
/// A leading byte order mark and whitespace are skipped. Rejects text that
/// does not then open with an XML declaration and any document the reader
/// finds ill-formed.
pub fn parse_document(raw: &str) -> Result<XmlElement, FeedError> {
    let raw = raw.trim_start_matches('\u{feff}').trim_start();
    if !raw.starts_with(XML_DECLARATION) {
        return Err(FeedError::InvalidDocument(
            "missing XML declaration".to_string(),
        ));
    }

    let mut reader = Reader::from_str(raw);
    // Synthetic document node at the bottom of the stack
    let mut stack = vec![XmlElement::new("#document")];

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(XmlElement::from_start(&start, &reader)?),
            Event::Empty(start) => {
                let element = XmlElement::from_start(&start, &reader)?;
                attach(&mut stack, element);
            }
            Event::End(end) => {
                if stack.len() < 2 {
                    return Err(FeedError::InvalidDocument(format!(
                        "unexpected closing tag </{}>",
                        String::from_utf8_lossy(end.name().as_ref())
                    )));
                }
                if let Some(element) = stack.pop() {
                    attach(&mut stack, element);
                }
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                if let Some(current) = stack.last_mut() {
                    current.push_text(&text);
                }
            }
            Event::CData(cdata) => {
                if let Some(current) = stack.last_mut() {
                    current.push_text(&String::from_utf8_lossy(&cdata));
                }
            }
            Event::Eof => break,
            // Declaration, comments, processing instructions, doctype
            _ => {}
        }
    }

    if stack.len() > 1 {
        let open = stack.last().map(|e| e.name.clone()).unwrap_or_default();
        return Err(FeedError::InvalidDocument(format!("unclosed element <{}>", open)));
    }

    let document = stack.pop().unwrap_or_default();
    let mut roots = document.nodes.into_iter().filter_map(|node| match node {
        XmlNode::Element(element) => Some(element),
        XmlNode::Text(_) => None,
    });
    roots
        .next()
        .ok_or_else(|| FeedError::InvalidDocument("no root element".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_declaration() {
        let err = parse_document("<rss></rss>").unwrap_err();
        assert!(matches!(err, FeedError::InvalidDocument(_)));

        // Leading whitespace is tolerated
        assert!(parse_document("\n  <?xml version=\"1.0\"?><rss/>").is_ok());
    }

    #[test]
    fn test_byte_order_mark_is_skipped() {
        let root = parse_document("\u{feff}<?xml version=\"1.0\"?><rss/>").unwrap();
        assert_eq!(root.name(), "rss");
        assert!(parse_document("\u{feff}\n<?xml version=\"1.0\"?><rss/>").is_ok());
        assert!(parse_document("\u{feff}<rss/>").is_err());
    }

    #[test]
    fn test_rejects_mismatched_and_unclosed_tags() {
        assert!(parse_document("<?xml version=\"1.0\"?><rss><item></rss>").is_err());
        assert!(parse_document("<?xml version=\"1.0\"?><rss><item>").is_err());
        assert!(parse_document("<?xml version=\"1.0\"?>").is_err());
    }

    #[test]
    fn test_names_attributes_and_text() {
        let root = parse_document(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <rss xmlns:demopartynet="https://www.demoparty.net">
              <item>
                <title>Revision &amp; friends</title>
                <demopartynet:country>de</demopartynet:country>
                <enclosure url="https://example.com/logo.png" type="image/png"/>
                <description><![CDATA[<p>Hello</p>]]></description>
              </item>
            </rss>"#,
        )
        .unwrap();

        assert_eq!(root.name(), "rss");
        let item = root.children().next().unwrap();
        let names: Vec<_> = item.children().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec!["title", "demopartynet:country", "enclosure", "description"]
        );

        let country = item.children().nth(1).unwrap();
        assert_eq!(country.local_name(), "country");
        assert_eq!(country.text_content(), "de");

        let title = item.children().next().unwrap();
        assert_eq!(title.text_content(), "Revision & friends");

        let enclosure = item.children().nth(2).unwrap();
        assert_eq!(enclosure.attribute("url"), Some("https://example.com/logo.png"));
        assert_eq!(enclosure.attribute("length"), None);

        let description = item.children().nth(3).unwrap();
        assert_eq!(description.text_content(), "<p>Hello</p>");
    }

    #[test]
    fn test_descendants_in_document_order() {
        let root = parse_document(
            "<?xml version=\"1.0\"?><a><b><c/></b><d/></a>",
        )
        .unwrap();
        let names: Vec<_> = root.descendants().map(|e| e.name()).collect();
        assert_eq!(names, vec!["b", "c", "d"]);
    }
}
