//! Batch GF calibration over many (depth, bottom time, TDT) rows.
//!
//! Rows are independent, so they are fitted in parallel with rayon. Each
//! result keeps the id of the row it came from.

use std::io::{Read, Write};

use csv::{ReaderBuilder, Trim};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::dive::GasMix;
use crate::error::Result;
use crate::simulator::Simulator;

use super::fit::GfFitter;
use super::GradientFactor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRow {
    pub id: String,
    pub depth_m: f64,
    pub bottom_time_min: f64,
    pub tdt_min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    pub id: String,
    pub depth_m: f64,
    pub bottom_time_min: f64,
    pub tdt_min: f64,
    pub gf_high: Option<GradientFactor>,
    pub error: Option<String>,
}

/// Fit every row on air. A failed row carries its error instead of a GF.
pub fn fit_batch<S>(
    simulator: &S,
    settings: &Settings,
    rows: &[CalibrationRow],
) -> Vec<CalibrationResult>
where
    S: Simulator + Sync + ?Sized,
{
    let fitter = GfFitter::new(simulator, settings);
    let results: Vec<CalibrationResult> = rows
        .par_iter()
        .map(|row| {
            let fit = fitter.fit(row.bottom_time_min, row.depth_m, row.tdt_min, GasMix::AIR);
            let (gf_high, error) = match fit {
                Ok(fit) => (Some(fit.gf), None),
                Err(err) => {
                    tracing::warn!(id = %row.id, error = %err, "calibration row failed");
                    (None, Some(err.to_string()))
                }
            };
            CalibrationResult {
                id: row.id.clone(),
                depth_m: row.depth_m,
                bottom_time_min: row.bottom_time_min,
                tdt_min: row.tdt_min,
                gf_high,
                error,
            }
        })
        .collect();

    let failed = results.iter().filter(|r| r.gf_high.is_none()).count();
    tracing::info!(rows = rows.len(), failed, "batch calibration finished");
    results
}

/// Read rows from CSV with an `id,depth_m,bottom_time_min,tdt_min` header.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<CalibrationRow>> {
    let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for record in csv_reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

pub fn write_results<W: Write>(writer: W, results: &[CalibrationResult]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for result in results {
        csv_writer.serialize(result)?;
    }
    csv_writer.flush()?;
    Ok(())
}
