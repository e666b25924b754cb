// Report functions. Each one reads the catalog through `QueryHelper` and/or
// `CatalogClient` and prints column-aligned text. Responses are handled as
// loose JSON documents: absent optional keys are skipped, absent required
// keys end the report with a `ReportError`.

use crate::api::{CatalogClient, QueryHelper, SearchRequest, SCAN_API_VERSION};
use crate::error::ReportError;
use crate::ui::Terminal;
use crossterm::style::Stylize;
use regex::Regex;
use reqwest::header::HeaderMap;
use serde::Serialize;
use serde_json::{json, Value};
use std::io::Write;

const TYPEDEF_GROUPS: [&str; 5] = [
    "enumDefs",
    "structDefs",
    "classificationDefs",
    "entityDefs",
    "relationshipDefs",
];

const SLOW_NOTICE: &str = "It may take several minutes to complete.";
const DETAILS_BANNER: &str = "Listing details for assets with assigned classifications...";

/// Registered data sources with their Azure resource coordinates.
pub fn list_data_sources(
    http: &QueryHelper,
    endpoint: &str,
    headers: &HeaderMap,
    term: &mut dyn Terminal,
) -> Result<(), ReportError> {
    let url = format!("{}/scan/datasources?api-version={}", endpoint, SCAN_API_VERSION);
    let Some(response) = http.get(&url, headers, term.out()) else {
        return Ok(());
    };

    let out = term.out();
    writeln!(out, "Registered Data Sources:")?;
    let header = format!(
        "{:<30} {:<20} {:<20} {:<36} {:<20} {:<16}",
        "Name", "Resource Type", "Resource Group", "Subscription Id", "Resource Name", "Region"
    );
    writeln!(out, "\n\n{}", header.green())?;

    for entity in items(&response, "value")? {
        let mut line = format!(
            "{:<30} {:<20} ",
            required(entity, "name")?,
            required(entity, "kind")?
        );
        if let Some(properties) = entity.get("properties") {
            for (key, width) in [
                ("resourceGroup", 21),
                ("subscriptionId", 37),
                ("resourceName", 21),
                ("location", 17),
            ] {
                if let Some(value) = present(properties, key) {
                    line.push_str(&format!("{:<width$}", text(value), width = width));
                }
            }
        }
        writeln!(out, "{}", line.trim_end())?;
    }
    writeln!(out, "\n\n")?;
    Ok(())
}

/// Integration runtimes, with the managed virtual network dumped when set.
pub fn list_integration_runtimes(
    http: &QueryHelper,
    endpoint: &str,
    headers: &HeaderMap,
    term: &mut dyn Terminal,
) -> Result<(), ReportError> {
    let url = format!(
        "{}/scan/integrationruntimes?api-version={}",
        endpoint, SCAN_API_VERSION
    );
    let Some(response) = http.get(&url, headers, term.out()) else {
        return Ok(());
    };

    let out = term.out();
    writeln!(out, "\n\n{}\n\n", "Integration Runtimes:".green())?;
    let header = format!("{:<40} {:<20} {:<40}", "Name", "Kind", "Properties");
    writeln!(out, "\n\n{}", header.green())?;

    for entity in items(&response, "value")? {
        let name = required(entity, "name")?;
        let kind = required(entity, "kind")?;
        let network = entity
            .get("properties")
            .and_then(|p| p.get("managedVirtualNetwork"));
        match network {
            Some(network) => writeln!(
                out,
                "{:<40} {:<20} {}",
                name,
                kind,
                wrap(&text(network), 30, 62)
            )?,
            None => writeln!(out, "{:<40} {:<20}", name, kind)?,
        }
    }
    writeln!(out, "\n\n")?;
    Ok(())
}

/// Type definitions whose name matches a pattern read from the user.
pub fn list_typedefs(
    http: &QueryHelper,
    endpoint: &str,
    headers: &HeaderMap,
    term: &mut dyn Terminal,
) -> Result<(), ReportError> {
    let url = format!("{}/catalog/api/atlas/v2/types/typedefs", endpoint);
    let Some(response) = http.get(&url, headers, term.out()) else {
        return Ok(());
    };

    let pattern = term
        .read_line("Enter a typeDef pattern to find: ")?
        .unwrap_or_default();
    let filter = NameFilter::new(&pattern);

    let out = term.out();
    writeln!(out, "\n\nListing Type Definitions:\n\n")?;
    let header = format!(
        "{:<80} {:<20} {:<20} {:<30}",
        "Name", "Category", "Version", "Description"
    );
    writeln!(out, "\n\n{}", header.green())?;

    for typedef in matching_typedefs(&response, &filter) {
        let description = typedef
            .get("description")
            .map(|d| wrap(&text(d), 30, 123))
            .unwrap_or_default();
        writeln!(
            out,
            "{:<80} {:<20} {:<20} {}",
            required(typedef, "name")?,
            typedef.get("category").map(text).unwrap_or_default(),
            typedef.get("version").map(text).unwrap_or_default(),
            description
        )?;
    }
    Ok(())
}

/// Every table-like asset that carries business (managed) attributes.
pub fn list_managed_attributes(
    catalog: &CatalogClient,
    term: &mut dyn Terminal,
) -> Result<(), ReportError> {
    term.clear()?;
    writeln!(
        term.out(),
        "\n\nListing assets with managed attributes... {}\n\n",
        SLOW_NOTICE.yellow()
    )?;

    let request = SearchRequest::keywords("*").with_filter(json!({ "objectType": "Tables" }));
    let response = search(catalog, &request, term)?;

    for asset in items(&response, "value")? {
        let id = required(asset, "id")?;
        let entity = catalog.entity_by_guid(&id)?;
        let attributes = entity
            .get("entity")
            .and_then(|e| e.get("businessAttributes"));
        if let Some(attributes) = attributes {
            let out = term.out();
            writeln!(out, "Asset Name: {} - {}", required(asset, "name")?, id)?;
            writeln!(out, "{}", to_pretty(attributes))?;
        }
    }
    Ok(())
}

/// Keyword search; prints each hit and its datamap entity, one at a time.
pub fn query_map(
    catalog: &CatalogClient,
    http: &QueryHelper,
    endpoint: &str,
    headers: &HeaderMap,
    term: &mut dyn Terminal,
) -> Result<(), ReportError> {
    term.clear()?;
    let keyword = term
        .read_line("Enter the keyword to search for: ")?
        .unwrap_or_default();
    writeln!(term.out(), "\n\n{} {}\n\n", DETAILS_BANNER, SLOW_NOTICE.yellow())?;
    tracing::debug!(%keyword, "searching the catalog");

    let response = search(catalog, &SearchRequest::keywords(keyword), term)?;

    for asset in items(&response, "value")? {
        writeln!(term.out(), "{}", to_pretty(asset))?;
        let url = datamap_entity_url(endpoint, &required(asset, "id")?);
        let details = http.get(&url, headers, term.out()).unwrap_or(Value::Null);
        writeln!(term.out(), "{}", to_pretty(&details))?;
        term.pause()?;
    }
    Ok(())
}

/// Classifications found on the entities referred to by each search hit.
pub fn list_classifications(
    catalog: &CatalogClient,
    http: &QueryHelper,
    endpoint: &str,
    headers: &HeaderMap,
    keyword: &str,
    entity_type: &str,
    term: &mut dyn Terminal,
) -> Result<(), ReportError> {
    term.clear()?;
    writeln!(term.out(), "\n\n{} {}\n\n", DETAILS_BANNER, SLOW_NOTICE.yellow())?;

    let request =
        SearchRequest::keywords(keyword).with_filter(json!({ "entityType": entity_type }));
    let response = search(catalog, &request, term)?;

    let mut assets = Vec::new();
    for asset in items(&response, "value")? {
        assets.push((required(asset, "id")?, required(asset, "name")?));
    }

    writeln!(term.out(), "{}", "Listing asset details by GUID.".green())?;
    for (guid, name) in assets {
        let url = datamap_entity_url(endpoint, &guid);
        let details = http
            .get(&url, headers, term.out())
            .ok_or_else(|| ReportError::Malformed(format!("no details for {}", guid)))?;
        let referred = details
            .get("referredEntities")
            .and_then(Value::as_object)
            .ok_or_else(|| ReportError::missing("referredEntities"))?;

        let mut classifications = Vec::new();
        for (referred_guid, entity) in referred {
            if !merge_classifications(&mut classifications, entity) {
                continue;
            }
            let entity_name = entity
                .get("attributes")
                .and_then(|a| a.get("name"))
                .map(text)
                .unwrap_or_default();
            writeln!(
                term.out(),
                "{} - {} - {} - {}",
                name,
                referred_guid,
                entity_name,
                classifications.join(", ").red()
            )?;
        }
    }
    Ok(())
}

/// Add the classification type names carried by `entity` to `acc`, skipping
/// names already present. Returns whether `entity` had any classification.
pub fn merge_classifications(acc: &mut Vec<String>, entity: &Value) -> bool {
    let Some(list) = entity.get("classifications").and_then(Value::as_array) else {
        return false;
    };
    let mut found = false;
    for type_name in list.iter().filter_map(|c| c.get("typeName").and_then(Value::as_str)) {
        found = true;
        if !acc.iter().any(|known| known == type_name) {
            acc.push(type_name.to_string());
        }
    }
    found
}

/// Name matcher for typedefs: a regular expression searched anywhere in the
/// name, or a plain substring when the pattern does not compile.
pub enum NameFilter {
    Pattern(Regex),
    Literal(String),
}

impl NameFilter {
    pub fn new(pattern: &str) -> Self {
        match Regex::new(pattern) {
            Ok(regex) => NameFilter::Pattern(regex),
            Err(e) => {
                tracing::debug!(error = %e, "pattern is not a valid regex, matching literally");
                NameFilter::Literal(pattern.to_string())
            }
        }
    }

    pub fn is_match(&self, name: &str) -> bool {
        match self {
            NameFilter::Pattern(regex) => regex.is_match(name),
            NameFilter::Literal(literal) => name.contains(literal.as_str()),
        }
    }
}

/// Typedefs of all five categories, in category order, whose name matches.
pub fn matching_typedefs<'a>(response: &'a Value, filter: &NameFilter) -> Vec<&'a Value> {
    TYPEDEF_GROUPS
        .iter()
        .filter_map(|group| response.get(*group).and_then(Value::as_array))
        .flatten()
        .filter(|typedef| {
            typedef
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(|name| filter.is_match(name))
        })
        .collect()
}

/// Split `text` into `width`-character lines; lines after the first are
/// indented by `padding` spaces.
pub fn wrap(text: &str, width: usize, padding: usize) -> String {
    if width == 0 {
        return text.to_string();
    }
    let chars: Vec<char> = text.chars().collect();
    let mut wrapped = String::with_capacity(text.len());
    for (i, chunk) in chars.chunks(width).enumerate() {
        if i > 0 {
            wrapped.push('\n');
            wrapped.push_str(&" ".repeat(padding));
        }
        wrapped.extend(chunk);
    }
    wrapped
}

/// JSON with a three-space indent.
pub fn to_pretty(value: &Value) -> String {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"   ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    if value.serialize(&mut serializer).is_err() {
        return value.to_string();
    }
    String::from_utf8(buf).unwrap_or_else(|_| value.to_string())
}

fn datamap_entity_url(endpoint: &str, guid: &str) -> String {
    format!("{}/datamap/api/atlas/v2/entity/guid/{}", endpoint, guid)
}

fn search(
    catalog: &CatalogClient,
    request: &SearchRequest,
    term: &mut dyn Terminal,
) -> Result<Value, ReportError> {
    let spinner = term.spinner("Searching the catalog...");
    let response = catalog.search(request);
    spinner.finish_and_clear();
    Ok(response?)
}

fn items<'a>(document: &'a Value, key: &str) -> Result<&'a Vec<Value>, ReportError> {
    document
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| ReportError::missing(key))
}

fn required(value: &Value, key: &str) -> Result<String, ReportError> {
    value.get(key).map(text).ok_or_else(|| ReportError::missing(key))
}

/// `key` when it holds something worth printing.
fn present<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    })
}

/// Strings print bare, everything else as compact JSON.
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
