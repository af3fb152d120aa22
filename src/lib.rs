//! dblp-orcid: alias <-> ORCID identity table from the DBLP XML dump
//!
//! This crate builds a canonical mapping between researcher aliases (name strings
//! as they appear in DBLP) and ORCID iDs, together with the secondary identifiers
//! found on DBLP person records (ResearcherID, Google Scholar, Scopus, ACM,
//! homepage) and the DBLP keys of those records.
//!
//! 1. **Parsing Pass** -- Stream the gzip-compressed dump once, emitting one event
//!    per `author` and `www` element and keeping only the currently open record
//! 2. **Classification** -- Turn each element into a typed fact: an alias/ORCID
//!    edge or a per-alias attribute record built from the record's URLs
//! 3. **Identity Graph** -- Accumulate the alias <-> ORCID bimap and the latest
//!    attribute record per alias
//! 4. **Merge Pass** -- Collapse the graph into one record per ORCID (aliases
//!    merged) or one record per alias (ORCIDs listed)
//! 5. **Export** -- Sort by primary key and write CSV with a dated header
//!
//! # Key Modules
//!
//! - [`parser`] -- Streaming XML reader with gzip decompression and DTD checks
//! - [`dtd`] -- Entity and element declarations of the DBLP DTD
//! - [`classify`] -- Element to fact classification, URL matcher table
//! - [`graph`] -- The identity graph session object
//! - [`ingest`] -- Parser to graph driver with progress reporting
//! - [`merge`] -- Grouped-by-ORCID and grouped-by-alias reducers
//! - [`export`] -- CSV output to stdout or file
//! - [`download`] -- Fetches the dump and DTD from dblp.org
//! - [`models`] -- Core data types
//! - [`stats`] -- Parsing counters
//! - [`config`] -- Constants
//!
//! # Example Usage
//!
//! ```bash
//! # Download the dump, group by ORCID and print the table
//! dblp-orcid --out --orcid
//!
//! # Reuse a local dump and write by_alias.csv
//! dblp-orcid --csv --alias --no-download --input dblp.xml.gz --dtd dblp.dtd
//! ```

pub mod classify;
pub mod config;
pub mod download;
pub mod dtd;
pub mod export;
pub mod graph;
pub mod ingest;
pub mod merge;
pub mod models;
pub mod parser;
pub mod stats;
