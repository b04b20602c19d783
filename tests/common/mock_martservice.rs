//! In-process stand-in for a BioMart `martservice` endpoint
//!
//! Serves a fixed registry, one gene dataset and TSV query results from an
//! axum router bound to a random local port. Counters and failure switches
//! let tests observe caching and retry behavior over real HTTP.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use biomart_gateway::{BiomartHttpService, Gateway};
use quick_xml::events::Event;
use quick_xml::Reader;
use tokio::net::TcpListener;

use super::constants::*;
use super::test_settings;

const REGISTRY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MartRegistry>
  <MartURLLocation database="ensembl_mart_115" default="1" displayName="Ensembl Genes 115" host="127.0.0.1" name="ENSEMBL_MART_ENSEMBL" path="/biomart/martservice" serverVirtualSchema="default" visible="1" />
  <MartURLLocation database="mouse_mart_115" default="0" displayName="Mouse strains 115" host="127.0.0.1" name="ENSEMBL_MART_MOUSE" path="/biomart/martservice" serverVirtualSchema="default" visible="1" />
  <MartURLLocation database="genomic_features_mart_115" default="0" displayName="Genomic features 115" host="127.0.0.1" name="ENSEMBL_MART_GENOMIC" path="/biomart/martservice" serverVirtualSchema="default" visible="0" />
</MartRegistry>
"#;

const DATASETS: &str = "\n\
TableSet\thsapiens_gene_ensembl\tHuman genes (GRCh38.p14)\t1\tGRCh38.p14\t200\t50000\tdefault\t2025-05-01 12:00:00\n\
TableSet\tmmusculus_gene_ensembl\tMouse genes (GRCm39)\t1\tGRCm39\t200\t50000\tdefault\t2025-05-01 12:00:00\n\
GenomicSequence\tgenomic_sequence\tSequences\t0\n";

const CONFIGURATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<DatasetConfig dataset="hsapiens_gene_ensembl" interfaces="default">
  <FilterPage internalName="filters">
    <FilterGroup internalName="GENE">
      <FilterCollection internalName="chromosome">
        <FilterDescription internalName="chromosome_name" type="list" description="Chromosome/scaffold name" />
      </FilterCollection>
      <FilterCollection internalName="id_list_filters">
        <FilterDescription internalName="ensembl_gene_id" type="id_list" description="Gene stable ID(s) [e.g. ENSG00000000003]" />
        <FilterDescription internalName="hgnc_symbol" type="id_list" description="HGNC symbol(s) [e.g. ZFY]" />
      </FilterCollection>
      <FilterCollection internalName="with_affy">
        <FilterDescription internalName="with_affy_hg_u133a" type="boolean_list" description="With AFFY HG U133A ID(s)" />
      </FilterCollection>
    </FilterGroup>
  </FilterPage>
  <AttributePage internalName="feature_page">
    <AttributeGroup internalName="gene">
      <AttributeCollection internalName="gene">
        <AttributeDescription internalName="ensembl_gene_id" displayName="Gene stable ID" description="Stable ID of the Gene" />
        <AttributeDescription internalName="hgnc_symbol" displayName="HGNC symbol" description="" />
        <AttributeDescription internalName="external_gene_name" displayName="Gene name" description="" />
        <AttributeDescription internalName="chromosome_name" displayName="Chromosome/scaffold name" description="" />
        <AttributeDescription internalName="description" displayName="Gene description" description="" />
        <AttributeDescription internalName="go_id" displayName="GO term accession" description="" />
        <AttributeDescription internalName="affy_hg_u133a" displayName="AFFY HG U133A probe" description="" />
        <AttributeDescription internalName="mmusculus_homolog_ensembl_gene" displayName="Mouse gene stable ID" description="" />
      </AttributeCollection>
    </AttributeGroup>
  </AttributePage>
  <AttributePage internalName="structure">
    <AttributeDescription internalName="ensembl_gene_id" displayName="Gene stable ID" />
  </AttributePage>
</DatasetConfig>
"#;

/// Queryable columns: internal name, display name.
const COLUMNS: [(&str, &str); 5] = [
    ("ensembl_gene_id", "Gene stable ID"),
    ("hgnc_symbol", "HGNC symbol"),
    ("external_gene_name", "Gene name"),
    ("chromosome_name", "Chromosome/scaffold name"),
    ("description", "Gene description"),
];

const GENES: [[&str; 5]; 4] = [
    [
        TP53_GENE_ID,
        TP53_SYMBOL,
        TP53_SYMBOL,
        "17",
        "tumor protein p53 [Source:HGNC Symbol;Acc:HGNC:11998]",
    ],
    [
        BRCA2_GENE_ID,
        BRCA2_SYMBOL,
        BRCA2_SYMBOL,
        "13",
        "BRCA2 DNA repair associated [Source:HGNC Symbol;Acc:HGNC:1101]",
    ],
    [
        EGFR_GENE_ID,
        EGFR_SYMBOL,
        EGFR_SYMBOL,
        "7",
        "epidermal growth factor receptor [Source:HGNC Symbol;Acc:HGNC:3236]",
    ],
    [UNNAMED_GENE_ID, "", "", "1", "novel transcript"],
];

/// Request counters and failure switches shared with the router.
#[derive(Default)]
pub struct MockMartState {
    pub registry_requests: AtomicUsize,
    pub query_requests: AtomicUsize,
    /// Number of upcoming queries to answer with HTTP 500
    pub failing_queries: AtomicUsize,
}

/// Mock martservice bound to a random local port
///
/// The server task is aborted when the value is dropped.
pub struct MockMartServer {
    /// Host to hand to the gateway, e.g. "http://127.0.0.1:12345"
    pub host: String,
    pub state: Arc<MockMartState>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockMartServer {
    pub async fn spawn() -> Self {
        let state = Arc::new(MockMartState::default());
        let app = Router::new()
            .route("/biomart/martservice", get(martservice))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock server failed");
        });

        Self {
            host: format!("http://127.0.0.1:{}", port),
            state,
            handle,
        }
    }

    /// A gateway wired to this server through the real HTTP client.
    pub fn gateway(&self) -> Arc<Gateway> {
        gateway_for(&self.host)
    }

    pub fn registry_requests(&self) -> usize {
        self.state.registry_requests.load(Ordering::SeqCst)
    }

    pub fn query_requests(&self) -> usize {
        self.state.query_requests.load(Ordering::SeqCst)
    }

    pub fn fail_next_queries(&self, count: usize) {
        self.state.failing_queries.store(count, Ordering::SeqCst);
    }
}

impl Drop for MockMartServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A gateway for an arbitrary host, reachable or not.
pub fn gateway_for(host: &str) -> Arc<Gateway> {
    let service = Arc::new(
        BiomartHttpService::new(Duration::from_secs(5)).expect("Failed to build HTTP client"),
    );
    Arc::new(Gateway::new(service, &test_settings(host)))
}

async fn martservice(
    State(state): State<Arc<MockMartState>>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    if let Some(query) = params.get("query") {
        state.query_requests.fetch_add(1, Ordering::SeqCst);
        let failing = state.failing_queries.load(Ordering::SeqCst);
        if failing > 0 {
            state.failing_queries.store(failing - 1, Ordering::SeqCst);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Service temporarily unavailable".to_string(),
            );
        }
        return (StatusCode::OK, run_query(query));
    }

    match params.get("type").map(String::as_str) {
        Some("registry") => {
            state.registry_requests.fetch_add(1, Ordering::SeqCst);
            (StatusCode::OK, REGISTRY.to_string())
        }
        Some("datasets") => match params.get("mart").map(String::as_str) {
            Some(ENSEMBL_MART) => (StatusCode::OK, DATASETS.to_string()),
            _ => (StatusCode::OK, "\n".to_string()),
        },
        Some("configuration") => match params.get("dataset").map(String::as_str) {
            Some(HUMAN_DATASET) => (StatusCode::OK, CONFIGURATION.to_string()),
            Some(other) => (
                StatusCode::OK,
                format!("Problem retrieving configuration for {}\n", other),
            ),
            None => (StatusCode::BAD_REQUEST, "Missing dataset".to_string()),
        },
        _ => (StatusCode::BAD_REQUEST, "Unknown request".to_string()),
    }
}

/// Evaluate a query document against [`GENES`] and render TSV with a header.
fn run_query(xml: &str) -> String {
    let mut dataset = String::new();
    let mut attributes = Vec::new();
    let mut filters = BTreeMap::new();

    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                let mut values = HashMap::new();
                for attr in element.attributes().flatten() {
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    let value = attr
                        .unescape_value()
                        .map(|v| v.into_owned())
                        .unwrap_or_default();
                    values.insert(key, value);
                }
                match element.name().as_ref() {
                    b"Dataset" => dataset = values.remove("name").unwrap_or_default(),
                    b"Attribute" => attributes.push(values.remove("name").unwrap_or_default()),
                    b"Filter" => {
                        let name = values.remove("name").unwrap_or_default();
                        let value = values.remove("value").unwrap_or_default();
                        filters.insert(name, value);
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return format!("Query ERROR: caught BioMart::Exception: {}", e),
        }
    }

    if dataset != HUMAN_DATASET {
        return format!(
            "Query ERROR: caught BioMart::Exception::Usage: Dataset {} NOT FOUND",
            dataset
        );
    }

    let column_of = |name: &str| COLUMNS.iter().position(|(internal, _)| *internal == name);

    let mut selected = Vec::new();
    for name in &attributes {
        match column_of(name) {
            Some(index) => selected.push(index),
            None => {
                return format!(
                    "Query ERROR: caught BioMart::Exception::Usage: Attribute {} NOT FOUND",
                    name
                )
            }
        }
    }

    let mut constraints = Vec::new();
    for (name, value) in &filters {
        match column_of(name) {
            Some(index) => constraints.push((index, value.split(',').collect::<Vec<_>>())),
            None => {
                return format!(
                    "Query ERROR: caught BioMart::Exception::Usage: Filter {} NOT FOUND",
                    name
                )
            }
        }
    }

    let header: Vec<&str> = selected.iter().map(|&i| COLUMNS[i].1).collect();
    let mut out = header.join("\t");
    out.push('\n');

    let mut seen = Vec::new();
    for gene in GENES.iter() {
        let matches = constraints
            .iter()
            .all(|(index, values)| values.contains(&gene[*index]));
        if !matches {
            continue;
        }
        let row = selected
            .iter()
            .map(|&i| gene[i])
            .collect::<Vec<_>>()
            .join("\t");
        // uniqueRows="1"
        if !seen.contains(&row) {
            out.push_str(&row);
            out.push('\n');
            seen.push(row);
        }
    }
    out
}
