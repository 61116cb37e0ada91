//! `dysni evaluate`: precision and recall of found pairs.

use std::fs::File;
use std::io::BufReader;

use anyhow::Context;
use clap::Args;
use tracing::info;

use super::output_result;
use crate::Cli;
use crate::evaluate::{GroundTruth, read_found};

#[derive(Args)]
pub struct EvaluateCommand {
    /// `id<TAB>duplicate` pairs written by `dysni resolve`
    #[arg(long)]
    pub found: String,

    /// CSV of true duplicate pairs, with a header row
    #[arg(long)]
    pub truth: String,
}

impl EvaluateCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let truth = File::open(&self.truth)
            .with_context(|| format!("failed to open {}", self.truth))?;
        let mut truth = GroundTruth::from_csv(truth)?;

        let found = File::open(&self.found)
            .with_context(|| format!("failed to open {}", self.found))?;
        let found = read_found(BufReader::new(found))?;

        let evaluation = truth.evaluate(&found);
        info!(
            precision = evaluation.precision,
            recall = evaluation.recall,
            "evaluated {} pairs",
            evaluation.found
        );
        output_result(&evaluation, cli.json)
    }
}
