//! XML documents exchanged with martservice: the host registry, dataset
//! configurations, and the query envelope.

use std::collections::{BTreeMap, HashSet};

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{Attribute, Filter, Mart, DEFAULT_VIRTUAL_SCHEMA};

/// Collect the attributes of one element into a name -> value map.
fn element_attributes(element: &BytesStart<'_>) -> Result<BTreeMap<String, String>, String> {
    let mut values = BTreeMap::new();
    for attr in element.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        values.insert(key, value.into_owned());
    }
    Ok(values)
}

/// Walk `xml` and hand every start/empty element to `visit`.
fn for_each_element<F>(xml: &str, mut visit: F) -> Result<(), String>
where
    F: FnMut(&[u8], &BytesStart<'_>) -> Result<(), String>,
{
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().map_err(|e| format!("Malformed XML: {}", e))? {
            Event::Start(element) | Event::Empty(element) => {
                visit(element.name().as_ref(), &element)?;
            }
            Event::Eof => return Ok(()),
            _ => {}
        }
    }
}

/// Parse the `type=registry` document into marts, in document order.
pub(crate) fn parse_registry(xml: &str) -> Result<Vec<Mart>, String> {
    let mut marts = Vec::new();
    for_each_element(xml, |name, element| {
        if name != b"MartURLLocation" && name != b"MartDBLocation" {
            return Ok(());
        }
        let attrs = element_attributes(element)?;
        let Some(mart_name) = attrs.get("name").filter(|n| !n.is_empty()) else {
            return Ok(());
        };
        marts.push(Mart {
            name: mart_name.clone(),
            display_name: attrs.get("displayName").cloned().unwrap_or_default(),
            virtual_schema: attrs
                .get("serverVirtualSchema")
                .filter(|s| !s.is_empty())
                .cloned()
                .unwrap_or_else(|| DEFAULT_VIRTUAL_SCHEMA.to_string()),
            visible: attrs.get("visible").map(|v| v == "1").unwrap_or(true),
        });
        Ok(())
    })?;
    Ok(marts)
}

/// Attributes and filters declared by a dataset configuration.
#[derive(Debug, Default)]
pub(crate) struct DatasetConfiguration {
    pub attributes: Vec<Attribute>,
    pub filters: Vec<Filter>,
}

/// Parse the `type=configuration` document.
///
/// Names repeated across attribute pages are reported once, at their first
/// position.
pub(crate) fn parse_configuration(xml: &str) -> Result<DatasetConfiguration, String> {
    let mut config = DatasetConfiguration::default();
    let mut seen_attributes = HashSet::new();
    let mut seen_filters = HashSet::new();

    for_each_element(xml, |name, element| {
        match name {
            b"AttributeDescription" => {
                let mut attrs = element_attributes(element)?;
                let Some(internal_name) = attrs.remove("internalName") else {
                    return Ok(());
                };
                if seen_attributes.insert(internal_name.clone()) {
                    config.attributes.push(Attribute {
                        name: internal_name,
                        display_name: attrs.remove("displayName").unwrap_or_default(),
                        description: attrs.remove("description").unwrap_or_default(),
                    });
                }
            }
            b"FilterDescription" => {
                let mut attrs = element_attributes(element)?;
                let Some(internal_name) = attrs.remove("internalName") else {
                    return Ok(());
                };
                if seen_filters.insert(internal_name.clone()) {
                    config.filters.push(Filter {
                        name: internal_name,
                        filter_type: attrs.remove("type").unwrap_or_default(),
                        description: attrs.remove("description").unwrap_or_default(),
                    });
                }
            }
            _ => {}
        }
        Ok(())
    })?;

    Ok(config)
}

/// Build the query document for a TSV result with a header row.
pub(crate) fn build_query(
    virtual_schema: &str,
    dataset: &str,
    attributes: &[String],
    filters: &BTreeMap<String, String>,
) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><!DOCTYPE Query>");
    xml.push_str(&format!(
        "<Query virtualSchemaName=\"{}\" formatter=\"TSV\" header=\"1\" uniqueRows=\"1\" datasetConfigVersion=\"0.6\">",
        escape(virtual_schema)
    ));
    xml.push_str(&format!(
        "<Dataset name=\"{}\" interface=\"default\">",
        escape(dataset)
    ));
    for (name, value) in filters {
        xml.push_str(&format!(
            "<Filter name=\"{}\" value=\"{}\"/>",
            escape(name),
            escape(value)
        ));
    }
    for name in attributes {
        xml.push_str(&format!("<Attribute name=\"{}\"/>", escape(name)));
    }
    xml.push_str("</Dataset></Query>");
    xml
}
