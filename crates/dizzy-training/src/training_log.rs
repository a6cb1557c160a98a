//! Append-only text log with one block per training iteration.
//!
//! ```text
//! ****************************** New Best ******************************
//!         1234 : [ -4.00,  -1.00, ...] Best average
//!         2345 : [ -3.90,  -1.10, ...] Best single
//!
//!         2345 : 2211.67 : [ -3.90,  -1.10, ...]
//!         ...
//!
//! Iteration 7	2026-10-14 12:00:00	10 game(s) per trial	10x20 board
//! ```
//!
//! The banner line only appears when the best single record improved.

use std::{
    fmt::Write as _,
    fs::{File, OpenOptions},
    io::{self, BufWriter, Write},
    path::Path,
};

use dizzy_engine::BitBoard;

use crate::cross_entropy::IterationReport;

#[derive(Debug)]
pub struct TrainingLog<W: Write> {
    writer: W,
}

impl TrainingLog<BufWriter<File>> {
    /// Opens `path` for appending, creating it if needed.
    pub fn append(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> TrainingLog<W> {
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Writes and flushes one iteration block.
    pub fn write_iteration(&mut self, report: &IterationReport) -> io::Result<()> {
        self.writer.write_all(format_iteration(report).as_bytes())?;
        self.writer.flush()
    }
}

#[must_use]
pub fn format_iteration(report: &IterationReport) -> String {
    let mut out = String::new();
    // writing to a String cannot fail
    let _ = write_block(&mut out, report);
    out
}

fn write_block(out: &mut String, report: &IterationReport) -> std::fmt::Result {
    let stars = "*".repeat(30);
    if report.new_best_single {
        writeln!(out, "{stars} New Best {stars}")?;
    }
    writeln!(
        out,
        "{:12.0} : [{}] Best average",
        report.best_mean.lines, report.best_mean.strategy
    )?;
    writeln!(
        out,
        "{:12.0} : [{}] Best single",
        report.best_single.lines, report.best_single.strategy
    )?;
    writeln!(out)?;
    for result in &report.elite {
        writeln!(
            out,
            "{:12.0} : {:.2} : [{}]",
            result.mean_lines, result.fitness, result.strategy
        )?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "Iteration {}\t{}\t{} game(s) per trial\t{}x{} board",
        report.iteration,
        report.finished_at.format("%Y-%m-%d %H:%M:%S"),
        report.games_per_trial,
        BitBoard::PLAYABLE_WIDTH,
        BitBoard::PLAYABLE_HEIGHT,
    )?;
    writeln!(out)
}
