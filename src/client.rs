use std::time::Duration;

use serde_json::Value;
use tracing::{debug, trace};

use crate::dataset::DatasetDescriptor;
use crate::domain::{RechnikError, Total};

pub const HUGGINGFACE_API_BASE: &str = "https://datasets-server.huggingface.co";

/// Where reads go: straight to the dataset server, or through the
/// same-origin proxy which hard-codes dataset/config/split on its side.
#[derive(Debug, Clone)]
pub enum Source {
    Direct { base: String },
    Proxy { base: String },
}

/// One fetched table row. The remote wraps the fields one level under a
/// "row" key in the direct shape; the constructor accepts either.
#[derive(Debug, Clone)]
pub struct Row {
    fields: serde_json::Map<String, Value>,
}

impl Row {
    pub fn from_value(value: Value) -> Self {
        let fields = match value {
            Value::Object(mut obj) => match obj.remove("row") {
                Some(Value::Object(inner)) => inner,
                Some(other) => {
                    obj.insert("row".to_string(), other);
                    obj
                }
                None => obj,
            },
            _ => serde_json::Map::new(),
        };
        Row { fields }
    }

    /// String form of a column value. Absent and falsy values (null, "",
    /// 0, false) collapse to the empty string.
    pub fn field(&self, key: &str) -> String {
        match self.fields.get(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Bool(b)) => {
                if *b {
                    "true".to_string()
                } else {
                    String::new()
                }
            }
            Some(Value::Number(n)) => {
                if n.as_f64() == Some(0.0) {
                    String::new()
                } else {
                    n.to_string()
                }
            }
            Some(other) => other.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageData {
    pub rows: Vec<Row>,
    pub total: Option<u64>,
}

impl PageData {
    /// Decodes a rows response. Missing fields degrade to empty/zero
    /// instead of failing; the remote shape is not under our control.
    pub fn from_value(value: Value) -> Self {
        let total = value.get("num_rows_total").and_then(Value::as_u64);
        let rows = match value {
            Value::Object(mut obj) => match obj.remove("rows") {
                Some(Value::Array(items)) => items.into_iter().map(Row::from_value).collect(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        PageData { rows, total }
    }
}

/// Reported total in either interface shape: `num_rows_total` from the
/// dataset server, `totalRows` (integer or the string "Unknown") from the
/// proxy's stats endpoint.
fn parse_total(value: &Value) -> Total {
    if let Some(n) = value.get("num_rows_total").and_then(Value::as_u64) {
        return Total::Known(n);
    }
    match value.get("totalRows").and_then(Value::as_u64) {
        Some(n) => Total::Known(n),
        None => Total::Unknown,
    }
}

pub struct DictClient {
    agent: ureq::Agent,
    source: Source,
}

impl DictClient {
    pub fn new(source: Source) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        DictClient { agent, source }
    }

    /// One read of `length` rows starting at `offset`. No caching, no
    /// retries; any failure surfaces to the caller.
    pub fn fetch_page(
        &self,
        dataset: &DatasetDescriptor,
        offset: usize,
        length: usize,
    ) -> Result<PageData, RechnikError> {
        let url = self.page_url(dataset, offset, length);
        trace!("GET {url}");
        let response = self.agent.get(&url).call()?;
        let value: Value = response
            .into_json()
            .map_err(|e| RechnikError::Malformed(e.to_string()))?;
        let page = PageData::from_value(value);
        debug!(
            "Fetched {} rows at offset {offset} (total {:?})",
            page.rows.len(),
            page.total
        );
        Ok(page)
    }

    /// Lightweight length=1 read solely for the total-row metadata.
    pub fn fetch_total(&self, dataset: &DatasetDescriptor) -> Result<Total, RechnikError> {
        let url = self.stats_url(dataset);
        trace!("GET {url}");
        let response = self.agent.get(&url).call()?;
        let value: Value = response
            .into_json()
            .map_err(|e| RechnikError::Malformed(e.to_string()))?;
        Ok(parse_total(&value))
    }

    fn page_url(&self, dataset: &DatasetDescriptor, offset: usize, length: usize) -> String {
        match &self.source {
            Source::Direct { base } => format!(
                "{base}/rows?dataset={}&config={}&split={}&offset={offset}&length={length}",
                urlencoding::encode(dataset.name),
                dataset.config,
                dataset.split,
            ),
            Source::Proxy { base } => {
                format!("{base}/api/dictionary?offset={offset}&length={length}")
            }
        }
    }

    fn stats_url(&self, dataset: &DatasetDescriptor) -> String {
        match &self.source {
            Source::Direct { .. } => self.page_url(dataset, 0, 1),
            Source::Proxy { base } => format!("{base}/api/stats"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset;
    use serde_json::json;

    fn alpaca() -> &'static DatasetDescriptor {
        dataset::find("alpaca").unwrap()
    }

    #[test]
    fn direct_page_url_encodes_dataset_name() {
        let client = DictClient::new(Source::Direct {
            base: HUGGINGFACE_API_BASE.to_string(),
        });
        let url = client.page_url(alpaca(), 200, 100);
        assert_eq!(
            url,
            "https://datasets-server.huggingface.co/rows?dataset=vislupus%2Falpaca-bulgarian-dictionary&config=default&split=train&offset=200&length=100"
        );
    }

    #[test]
    fn proxy_urls_carry_only_pagination() {
        let client = DictClient::new(Source::Proxy {
            base: "http://localhost:3000".to_string(),
        });
        assert_eq!(
            client.page_url(alpaca(), 0, 100),
            "http://localhost:3000/api/dictionary?offset=0&length=100"
        );
        assert_eq!(
            client.stats_url(alpaca()),
            "http://localhost:3000/api/stats"
        );
    }

    #[test]
    fn direct_stats_url_is_a_length_one_read() {
        let client = DictClient::new(Source::Direct {
            base: HUGGINGFACE_API_BASE.to_string(),
        });
        assert!(client.stats_url(alpaca()).ends_with("offset=0&length=1"));
    }

    #[test]
    fn row_unwraps_envelope() {
        let wrapped = Row::from_value(json!({"row": {"word": "куче"}, "row_idx": 7}));
        assert_eq!(wrapped.field("word"), "куче");

        let flat = Row::from_value(json!({"word": "котка"}));
        assert_eq!(flat.field("word"), "котка");
    }

    #[test]
    fn field_coerces_falsy_values_to_empty() {
        let row = Row::from_value(json!({
            "a": null, "b": 0, "c": false, "d": "", "e": 42, "f": true, "g": "x"
        }));
        for key in ["a", "b", "c", "d", "missing"] {
            assert_eq!(row.field(key), "", "key {key}");
        }
        assert_eq!(row.field("e"), "42");
        assert_eq!(row.field("f"), "true");
        assert_eq!(row.field("g"), "x");
    }

    #[test]
    fn page_data_defends_against_missing_fields() {
        let page = PageData::from_value(json!({}));
        assert!(page.rows.is_empty());
        assert_eq!(page.total, None);

        let page = PageData::from_value(json!({"rows": [{"row": {"w": "a"}}], "num_rows_total": 2}));
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.total, Some(2));
    }

    #[test]
    fn parse_total_reads_both_shapes() {
        assert_eq!(parse_total(&json!({"num_rows_total": 250})), Total::Known(250));
        assert_eq!(parse_total(&json!({"totalRows": 250})), Total::Known(250));
        assert_eq!(parse_total(&json!({"totalRows": "Unknown"})), Total::Unknown);
        assert_eq!(parse_total(&json!({})), Total::Unknown);
        assert_eq!(parse_total(&json!({"num_rows_total": 0})), Total::Known(0));
    }
}
