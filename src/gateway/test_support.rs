//! Mock catalog collaborators and a log capture for gateway unit tests.

use std::collections::{BTreeMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{GatewayError, Table};
use crate::biomart::{Attribute, DatasetInfo, Filter, Mart, MartConnection, MartService};

/// In-memory catalog with scripted query outcomes and call counters.
pub struct MockConnection {
    host: String,
    pub marts: Vec<Mart>,
    pub datasets: Vec<DatasetInfo>,
    pub attributes: Vec<Attribute>,
    pub filters: Vec<Filter>,
    scripted: Mutex<VecDeque<Result<Table, GatewayError>>>,
    fallback: Mutex<Option<Table>>,
    pub query_calls: AtomicUsize,
    query_delays: Mutex<Vec<(String, Duration)>>,
    pub last_query: Mutex<Option<(Vec<String>, BTreeMap<String, String>)>>,
}

impl MockConnection {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            marts: vec![mart("ENSEMBL_MART_ENSEMBL", "Ensembl Genes 115")],
            datasets: vec![DatasetInfo {
                name: "hsapiens_gene_ensembl".to_string(),
                display_name: "Human genes (GRCh38.p14)".to_string(),
            }],
            attributes: Vec::new(),
            filters: Vec::new(),
            scripted: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(None),
            query_calls: AtomicUsize::new(0),
            query_delays: Mutex::new(Vec::new()),
            last_query: Mutex::new(None),
        }
    }

    pub fn with_attributes(mut self, names: &[&str]) -> Self {
        self.attributes = names
            .iter()
            .map(|name| Attribute {
                name: name.to_string(),
                display_name: format!("{} (display)", name),
                description: String::new(),
            })
            .collect();
        self
    }

    pub fn with_filters(mut self, names: &[&str]) -> Self {
        self.filters = names
            .iter()
            .map(|name| Filter {
                name: name.to_string(),
                filter_type: "text".to_string(),
                description: String::new(),
            })
            .collect();
        self
    }

    /// Queue the outcome of the next query call.
    pub fn push_query_result(&self, result: Result<Table, GatewayError>) {
        self.scripted.lock().unwrap().push_back(result);
    }

    /// Result returned once the scripted outcomes are used up.
    pub fn set_fallback(&self, table: Table) {
        *self.fallback.lock().unwrap() = Some(table);
    }

    /// Stall queries selecting `attribute` before answering them.
    pub fn delay_queries_selecting(&self, attribute: &str, delay: Duration) {
        self.query_delays
            .lock()
            .unwrap()
            .push((attribute.to_string(), delay));
    }

    pub fn query_count(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    fn known_mart(&self, mart: &str) -> Result<(), GatewayError> {
        if self.marts.iter().any(|m| m.name == mart) {
            Ok(())
        } else {
            Err(GatewayError::QueryFailure(format!("Unknown mart: {}", mart)))
        }
    }
}

pub fn mart(name: &str, display_name: &str) -> Mart {
    Mart {
        name: name.to_string(),
        display_name: display_name.to_string(),
        virtual_schema: "default".to_string(),
        visible: true,
    }
}

#[async_trait]
impl MartConnection for MockConnection {
    fn host(&self) -> &str {
        &self.host
    }

    async fn list_marts(&self) -> Result<Vec<Mart>, GatewayError> {
        Ok(self.marts.clone())
    }

    async fn list_datasets(&self, mart: &str) -> Result<Vec<DatasetInfo>, GatewayError> {
        self.known_mart(mart)?;
        Ok(self.datasets.clone())
    }

    async fn list_attributes(
        &self,
        mart: &str,
        _dataset: &str,
    ) -> Result<Vec<Attribute>, GatewayError> {
        self.known_mart(mart)?;
        Ok(self.attributes.clone())
    }

    async fn list_filters(&self, mart: &str, _dataset: &str) -> Result<Vec<Filter>, GatewayError> {
        self.known_mart(mart)?;
        Ok(self.filters.clone())
    }

    async fn query(
        &self,
        mart: &str,
        _dataset: &str,
        attributes: &[String],
        filters: &BTreeMap<String, String>,
    ) -> Result<Table, GatewayError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self
            .query_delays
            .lock()
            .unwrap()
            .iter()
            .find(|(attribute, _)| attributes.contains(attribute))
            .map(|(_, delay)| *delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        *self.last_query.lock().unwrap() = Some((attributes.to_vec(), filters.clone()));
        self.known_mart(mart)?;

        if let Some(result) = self.scripted.lock().unwrap().pop_front() {
            return result;
        }
        self.fallback
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| GatewayError::QueryFailure("no scripted result".to_string()))
    }
}

/// Hands out one shared [`MockConnection`] per host and counts connects.
pub struct MockMartService {
    pub connection: Arc<MockConnection>,
    pub connect_calls: AtomicUsize,
    pub fail_connect: AtomicBool,
    connect_delay: Mutex<Option<Duration>>,
}

impl MockMartService {
    pub fn new(connection: MockConnection) -> Self {
        Self {
            connection: Arc::new(connection),
            connect_calls: AtomicUsize::new(0),
            fail_connect: AtomicBool::new(false),
            connect_delay: Mutex::new(None),
        }
    }

    pub fn set_connect_delay(&self, delay: Duration) {
        *self.connect_delay.lock().unwrap() = Some(delay);
    }

    pub fn connect_count(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MartService for MockMartService {
    async fn connect(&self, host: &str) -> Result<Arc<dyn MartConnection>, GatewayError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.connect_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(GatewayError::ConnectionFailure(format!(
                "Failed to reach {}: connection refused",
                host
            )));
        }
        let connection: Arc<dyn MartConnection> = self.connection.clone();
        Ok(connection)
    }
}

/// Captures formatted `tracing` output for assertions on the diagnostic stream.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Install as the thread's default subscriber until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Number of captured lines containing `needle`.
    pub fn count(&self, needle: &str) -> usize {
        self.contents()
            .lines()
            .filter(|line| line.contains(needle))
            .count()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
    let mut table = Table::new(columns.iter().copied());
    for row in rows {
        table.push_row(row.iter().copied());
    }
    table
}
