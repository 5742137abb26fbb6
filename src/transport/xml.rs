use super::error::TransportError;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

/// A fully materialized XML element tree.
///
/// The server's payloads are small (a hall listing, one event batch), so we
/// read them into a tree once and let callers navigate by name instead of
/// streaming. Parsing is defensive: anything structurally broken surfaces as
/// `TransportError::Xml` and the caller decides whether that is fatal.
#[derive(Debug, Default, Clone)]
pub struct Element {
    pub name: String,
    pub attrs: HashMap<String, String>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    pub fn parse(xml: &str) -> Result<Element, TransportError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        let mut stack: Vec<Element> = Vec::new();
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => stack.push(Self::open(&e)?),
                Ok(Event::Empty(e)) => {
                    let element = Self::open(&e)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => return Ok(element),
                    }
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| TransportError::Xml("unbalanced close tag".into()))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => return Ok(element),
                    }
                }
                Ok(Event::Text(t)) => {
                    if let Some(element) = stack.last_mut() {
                        element.text.push_str(&t.unescape().unwrap_or_default());
                    }
                }
                Ok(Event::Eof) => {
                    return Err(TransportError::Xml("document ended early".into()))
                }
                Ok(_) => continue,
                Err(e) => return Err(TransportError::Xml(e.to_string())),
            }
        }
    }

    fn open(e: &BytesStart) -> Result<Element, TransportError> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut attrs = HashMap::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|e| TransportError::Xml(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| TransportError::Xml(e.to_string()))?
                .into_owned();
            attrs.insert(key, value);
        }
        Ok(Element {
            name,
            attrs,
            children: Vec::new(),
            text: String::new(),
        })
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    pub fn attr_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.attr(key).unwrap_or(default)
    }

    /// All descendants (depth-first) with the given tag name.
    pub fn find_all<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect(name, &mut found);
        found
    }

    fn collect<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.name == name {
                found.push(child);
            }
            child.collect(name, found);
        }
    }

    pub fn find<'a>(&'a self, name: &str) -> Option<&'a Element> {
        self.find_all(name).into_iter().next()
    }
}

/// One long-poll or decision-post response: the server's cursor, a finished
/// marker, and the raw event elements in server order.
#[derive(Debug, Default, Clone)]
pub struct Update {
    pub channel: crate::Channel,
    pub finished: bool,
    pub events: Vec<Element>,
}

impl Update {
    /// Accepts both envelope shapes the server uses: `<gameState cn=…>` on
    /// join and `<update cn=…>` on polls. An unparseable channel keeps the
    /// caller's `fallback` so the cursor never regresses on a bad payload.
    pub fn parse(xml: &str, fallback: crate::Channel) -> Result<Update, TransportError> {
        let root = Element::parse(xml)?;
        let channel = root
            .attr("cn")
            .and_then(|cn| cn.parse::<crate::Channel>().ok())
            .unwrap_or(fallback);
        let finished = root.attr("finished") == Some("true");
        let events = root.find_all("ge").into_iter().cloned().collect();
        Ok(Update {
            channel,
            finished,
            events,
        })
    }
}
