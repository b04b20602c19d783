//! Shared constants for end-to-end tests
//!
//! When the mock catalog changes, update only this file and the fixture
//! documents in `mock_martservice.rs`.

// ============================================================================
// Catalog names
// ============================================================================

/// Visible mart hosting the gene datasets
pub const ENSEMBL_MART: &str = "ENSEMBL_MART_ENSEMBL";

/// Second visible mart, no datasets of interest
pub const MOUSE_MART: &str = "ENSEMBL_MART_MOUSE";

/// Mart flagged invisible in the registry
pub const HIDDEN_MART: &str = "ENSEMBL_MART_GENOMIC";

/// Human gene dataset
pub const HUMAN_DATASET: &str = "hsapiens_gene_ensembl";

// ============================================================================
// Genes in the mock dataset
// ============================================================================

pub const TP53_SYMBOL: &str = "TP53";
pub const TP53_GENE_ID: &str = "ENSG00000141510";

pub const BRCA2_SYMBOL: &str = "BRCA2";
pub const BRCA2_GENE_ID: &str = "ENSG00000139618";

pub const EGFR_SYMBOL: &str = "EGFR";
pub const EGFR_GENE_ID: &str = "ENSG00000146648";

/// Gene without an HGNC symbol
pub const UNNAMED_GENE_ID: &str = "ENSG00000228037";

// ============================================================================
// Timing
// ============================================================================

/// Delay between retries in tests, in milliseconds
pub const TEST_RETRY_DELAY_MS: u64 = 10;
