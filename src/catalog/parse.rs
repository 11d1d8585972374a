//! Parses THREDDS inventory catalog XML into a [`CatalogNode`].

use std::collections::HashMap;

use quick_xml::{
    events::{BytesStart, Event},
    name::{Namespace, ResolveResult},
    NsReader,
};
use url::Url;

use super::{CatalogNode, CatalogRef, Dataset, Service};
use crate::error::CrawlError;

pub const INV_CATALOG_NS: &str = "http://www.unidata.ucar.edu/namespaces/thredds/InvCatalog/v1.0";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Namespaces that catalog elements and reference attributes live in.
#[derive(Debug, Clone)]
pub struct Namespaces {
    pub catalog: String,
    pub xlink: String,
}

impl Default for Namespaces {
    fn default() -> Self {
        Namespaces {
            catalog: INV_CATALOG_NS.to_string(),
            xlink: XLINK_NS.to_string(),
        }
    }
}

impl Namespaces {
    // Unqualified elements are accepted as well; some servers omit xmlns.
    fn is_catalog(&self, ns: &ResolveResult) -> bool {
        match ns {
            ResolveResult::Bound(Namespace(uri)) => *uri == self.catalog.as_bytes(),
            ResolveResult::Unbound => true,
            ResolveResult::Unknown(_) => false,
        }
    }

    fn is_xlink(&self, ns: &ResolveResult) -> bool {
        matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == self.xlink.as_bytes())
    }
}

#[derive(Debug)]
struct DatasetFrame {
    name: String,
    id: Option<String>,
    url_path: Option<String>,
    service_name: Option<String>,
}

#[derive(Debug, Default)]
struct Attributes {
    plain: HashMap<String, String>,
    xlink: HashMap<String, String>,
}

#[derive(Debug)]
struct ParseState {
    node: CatalogNode,
    datasets: Vec<DatasetFrame>,
    services: Vec<String>,
    default_service: Option<String>,
    in_service_name: bool,
}

/// Parses `xml`, the catalog document found at `url`.
pub fn parse_catalog(
    xml: &str,
    url: Url,
    namespaces: &Namespaces,
) -> Result<CatalogNode, CrawlError> {
    let mut reader = NsReader::from_str(xml);
    let mut buf = Vec::new();
    let mut state = ParseState {
        node: CatalogNode::new(url),
        datasets: Vec::new(),
        services: Vec::new(),
        default_service: None,
        in_service_name: false,
    };

    loop {
        let (in_catalog, event) = match reader.read_resolved_event_into(&mut buf) {
            Ok((ns, event)) => (namespaces.is_catalog(&ns), event),
            Err(e) => return Err(CrawlError::unavailable(&state.node.url, e)),
        };

        match event {
            Event::Start(e) if in_catalog => {
                let attributes = read_attributes(&reader, &e, namespaces)
                    .map_err(|reason| CrawlError::unavailable(&state.node.url, reason))?;
                state.open(e.local_name().as_ref(), attributes, false);
            }
            Event::Empty(e) if in_catalog => {
                let attributes = read_attributes(&reader, &e, namespaces)
                    .map_err(|reason| CrawlError::unavailable(&state.node.url, reason))?;
                state.open(e.local_name().as_ref(), attributes, true);
            }
            Event::End(e) if in_catalog => state.close(e.local_name().as_ref()),
            Event::Text(t) if state.in_service_name => {
                let text = t
                    .unescape()
                    .map_err(|e| CrawlError::unavailable(&state.node.url, e))?;
                state.service_name(text.trim());
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let mut node = state.node;
    if let Some(default) = state.default_service {
        for dataset in node.datasets.iter_mut().filter(|d| d.service_name.is_none()) {
            dataset.service_name = Some(default.clone());
        }
    }

    Ok(node)
}

fn read_attributes(
    reader: &NsReader<&[u8]>,
    element: &BytesStart<'_>,
    namespaces: &Namespaces,
) -> Result<Attributes, String> {
    let mut attributes = Attributes::default();

    for attr in element.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let (ns, local) = reader.resolve_attribute(attr.key);
        let key = String::from_utf8_lossy(local.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();

        if namespaces.is_xlink(&ns) {
            attributes.xlink.insert(key, value);
        } else {
            attributes.plain.insert(key, value);
        }
    }

    Ok(attributes)
}

impl ParseState {
    fn open(&mut self, element: &[u8], mut attributes: Attributes, empty: bool) {
        match element {
            b"catalog" => self.node.name = attributes.plain.remove("name"),
            b"service" => {
                let name = attributes.plain.remove("name").unwrap_or_default();
                self.node.services.push(Service {
                    name: name.clone(),
                    kind: attributes.plain.remove("serviceType").unwrap_or_default(),
                    base: attributes.plain.remove("base").unwrap_or_default(),
                    parent: self.services.last().cloned(),
                });
                if !empty {
                    self.services.push(name);
                }
            }
            b"dataset" => {
                let inherited = self.datasets.last().and_then(|f| f.service_name.clone());
                let frame = DatasetFrame {
                    name: attributes.plain.remove("name").unwrap_or_default(),
                    id: attributes.plain.remove("ID"),
                    url_path: attributes.plain.remove("urlPath"),
                    service_name: attributes.plain.remove("serviceName").or(inherited),
                };
                if empty {
                    self.finish_dataset(frame);
                } else {
                    self.datasets.push(frame);
                }
            }
            b"catalogRef" => {
                let title = attributes
                    .xlink
                    .remove("title")
                    .or_else(|| attributes.plain.remove("name"))
                    .unwrap_or_default();
                match attributes.xlink.remove("href") {
                    Some(href) => self.node.references.push(CatalogRef { title, href }),
                    None => tracing::debug!(title = %title, "catalogRef without xlink:href"),
                }
            }
            b"serviceName" if !empty => self.in_service_name = true,
            _ => {}
        }
    }

    fn close(&mut self, element: &[u8]) {
        match element {
            b"service" => {
                self.services.pop();
            }
            b"dataset" => {
                if let Some(frame) = self.datasets.pop() {
                    self.finish_dataset(frame);
                }
            }
            b"serviceName" => self.in_service_name = false,
            _ => {}
        }
    }

    fn service_name(&mut self, name: &str) {
        if name.is_empty() {
            return;
        }
        match self.datasets.last_mut() {
            Some(frame) => frame.service_name = Some(name.to_string()),
            None => self.default_service = Some(name.to_string()),
        }
    }

    fn finish_dataset(&mut self, frame: DatasetFrame) {
        if let Some(url_path) = frame.url_path {
            self.node.datasets.push(Dataset {
                name: frame.name,
                id: frame.id,
                url_path,
                service_name: frame.service_name,
            });
        }
    }
}

// -- Tests -------------------------------------------------------------------
