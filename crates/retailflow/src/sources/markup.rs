//! Markup sources: XML record trees and HTML tables.

use std::path::Path;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use scraper::{Html, Selector};

use crate::error::{PipelineError, Result};
use crate::table::Table;

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("th, td").unwrap());

/// Read an XML document where each child of the root is one record.
///
/// Record attributes and the text of each child element become fields.
pub fn read_xml_records(name: &str, path: &Path) -> Result<Table> {
    let text = super::read_text(path)?;
    parse_xml_records(name, &text)
}

pub(crate) fn parse_xml_records(name: &str, text: &str) -> Result<Table> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut records: Vec<IndexMap<String, String>> = Vec::new();
    let mut current: Option<IndexMap<String, String>> = None;
    let mut field: Option<String> = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event().map_err(|e| PipelineError::source(name, e))? {
            Event::Start(element) => {
                depth += 1;
                match depth {
                    2 => {
                        let mut record = IndexMap::new();
                        collect_attributes(name, &element, &mut record)?;
                        current = Some(record);
                    }
                    3 => {
                        let key = tag_name(&element);
                        if let Some(record) = current.as_mut() {
                            record.entry(key.clone()).or_default();
                        }
                        field = Some(key);
                    }
                    _ => {}
                }
            }
            Event::Empty(element) => match depth + 1 {
                2 => {
                    let mut record = IndexMap::new();
                    collect_attributes(name, &element, &mut record)?;
                    records.push(record);
                }
                3 => {
                    if let Some(record) = current.as_mut() {
                        record.entry(tag_name(&element)).or_default();
                    }
                }
                _ => {}
            },
            Event::Text(content) => {
                if let (Some(record), Some(key)) = (current.as_mut(), field.as_ref()) {
                    let content = content
                        .unescape()
                        .map_err(|e| PipelineError::source(name, e))?;
                    record.entry(key.clone()).or_default().push_str(&content);
                }
            }
            Event::CData(content) => {
                if let (Some(record), Some(key)) = (current.as_mut(), field.as_ref()) {
                    let content = content.into_inner();
                    record
                        .entry(key.clone())
                        .or_default()
                        .push_str(&String::from_utf8_lossy(&content));
                }
            }
            Event::End(_) => {
                match depth {
                    2 => records.extend(current.take()),
                    3 => field = None,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if records.is_empty() {
        return Err(PipelineError::source(name, "XML document holds no records"));
    }
    Ok(keyed_rows_to_table(name, records))
}

fn tag_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

fn collect_attributes(
    name: &str,
    element: &BytesStart<'_>,
    out: &mut IndexMap<String, String>,
) -> Result<()> {
    for attribute in element.attributes() {
        let attribute = attribute.map_err(|e| PipelineError::source(name, e))?;
        let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| PipelineError::source(name, e))?;
        out.insert(key, value.into_owned());
    }
    Ok(())
}

/// Read the first table of an HTML document; its first row is the header.
pub fn read_html_table(name: &str, path: &Path) -> Result<Table> {
    let text = super::read_text(path)?;
    parse_html_table(name, &text)
}

pub(crate) fn parse_html_table(name: &str, text: &str) -> Result<Table> {
    let document = Html::parse_document(text);
    let table = document
        .select(&TABLE)
        .next()
        .ok_or_else(|| PipelineError::source(name, "HTML document has no table"))?;

    let mut rows = table.select(&ROW).map(|row| {
        row.select(&CELL)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect::<Vec<_>>()
    });

    let headers = rows
        .next()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| PipelineError::source(name, "HTML table has no header row"))?;
    let data: Vec<Vec<String>> = rows.filter(|r| !r.is_empty()).collect();

    Ok(Table::from_text_rows(name, headers, data))
}

fn keyed_rows_to_table(name: &str, records: Vec<IndexMap<String, String>>) -> Table {
    let mut headers: Vec<String> = Vec::new();
    for record in &records {
        for key in record.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .into_iter()
        .map(|mut record| {
            headers
                .iter()
                .map(|h| record.swap_remove(h).unwrap_or_default())
                .collect()
        })
        .collect();

    Table::from_text_rows(name, headers, rows)
}
