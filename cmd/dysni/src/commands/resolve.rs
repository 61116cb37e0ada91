//! `dysni resolve`: stream a CSV file through a resolver.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, bail};
use clap::{Args, ValueEnum};
use dysni::{BruteForceResolver, EntityResolver, IndexerBuilder};
use dysni_store::{MemoryStore, RecordStore, RedbStore};
use serde::Serialize;
use tracing::info;

use super::output_result;
use crate::Cli;
use crate::config::DatasetConfig;
use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResolverKind {
    /// Sorted neighborhood indexes
    Dysni,
    /// Compare against every earlier record
    BruteForce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Memory,
    Redb,
}

#[derive(Args)]
pub struct ResolveCommand {
    /// CSV file with a header row
    #[arg(short = 'i', long)]
    pub input: String,

    /// Dataset file (default: built-in CD dataset)
    #[arg(long)]
    pub config: Option<String>,

    /// Write `id<TAB>duplicate` pairs to this file
    #[arg(short = 'o', long)]
    pub output: Option<String>,

    #[arg(long, value_enum, default_value_t = ResolverKind::Dysni)]
    pub resolver: ResolverKind,

    #[arg(long, value_enum, default_value_t = StoreKind::Memory)]
    pub store: StoreKind,

    /// Database path for the redb store
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Compare candidates on the calling thread
    #[arg(long)]
    pub sequential: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub resolver: String,
    pub records: u64,
    pub pairs: u64,
    pub comparisons: u64,
    pub elapsed_ms: u64,
}

impl ResolveCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let config = match &self.config {
            Some(path) => DatasetConfig::load(path)?,
            None => DatasetConfig::default(),
        };
        let store: Arc<dyn RecordStore<String, Record>> = match self.store {
            StoreKind::Memory => Arc::new(MemoryStore::<String, Record>::new()),
            StoreKind::Redb => {
                let path = self
                    .db
                    .as_ref()
                    .context("--db is required with --store redb")?;
                Arc::new(RedbStore::<String, Record>::open(path)?)
            }
        };
        let input = File::open(&self.input)
            .with_context(|| format!("failed to open {}", self.input))?;

        let summary = match &self.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("failed to create {}", path))?;
                resolve(&config, store, self.resolver, !self.sequential, input, BufWriter::new(file))?
            }
            None => resolve(&config, store, self.resolver, !self.sequential, input, io::sink())?,
        };
        output_result(&summary, cli.json)
    }
}

/// Inserts every CSV row into a fresh resolver and writes each returned
/// cluster member as a pair with the row's id.
pub fn resolve<R: Read, W: Write>(
    config: &DatasetConfig,
    store: Arc<dyn RecordStore<String, Record>>,
    kind: ResolverKind,
    parallel: bool,
    input: R,
    mut pairs_out: W,
) -> anyhow::Result<Summary> {
    let classifier = config.classifier();
    let mut resolver: Box<dyn EntityResolver<Record, String>> = match kind {
        ResolverKind::Dysni => {
            let mut builder =
                IndexerBuilder::with_shared(store, Arc::clone(&classifier)).parallel(parallel);
            for index in config.index_configs(&classifier) {
                builder = builder.index(index);
            }
            Box::new(builder.build()?)
        }
        ResolverKind::BruteForce => {
            Box::new(BruteForceResolver::with_shared(store, classifier).with_parallel(parallel))
        }
    };

    let mut reader = csv::Reader::from_reader(input);
    let headers = reader.headers()?.clone();
    let Some(id_column) = headers.iter().position(|h| h == config.id_field) else {
        bail!("id column {:?} not in header", config.id_field);
    };

    let started = Instant::now();
    let (mut records, mut pairs) = (0u64, 0u64);
    for row in reader.records() {
        let row = row?;
        let id = row.get(id_column).unwrap_or_default().to_string();
        let record: Record = headers.iter().zip(row.iter()).collect();

        let mut cluster: Vec<String> = resolver.insert(&record, id.clone())?.into_iter().collect();
        cluster.sort();
        for other in &cluster {
            writeln!(pairs_out, "{}\t{}", id, other)?;
        }
        records += 1;
        pairs += cluster.len() as u64;
        if records % 1000 == 0 {
            info!(records, pairs, "progress");
        }
    }
    pairs_out.flush()?;

    let summary = Summary {
        resolver: kind
            .to_possible_value()
            .map(|v| v.get_name().to_string())
            .unwrap_or_default(),
        records,
        pairs,
        comparisons: resolver.comparisons(),
        elapsed_ms: started.elapsed().as_millis() as u64,
    };
    resolver.close()?;
    info!(records, pairs, comparisons = summary.comparisons, "resolved input");
    Ok(summary)
}
