use std::path::Path;

use anyhow::{Context, Result};
use imgmatch::{Candidate, ComparisonResult, SearchResult, ThresholdMatches, TopMatches};
use serde::Serialize;

/// `{"success": true, ...body}`
#[derive(Serialize)]
struct Success<'a, T: Serialize> {
    success: bool,
    #[serde(flatten)]
    body: &'a T,
}

#[derive(Serialize)]
struct Failure<'a> {
    success: bool,
    error: &'a str,
}

#[derive(Serialize)]
struct Comparison<'a> {
    #[serde(flatten)]
    result: &'a ComparisonResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    diff_path: Option<&'a Path>,
}

#[derive(Serialize)]
struct BestMatch<'a> {
    image: &'a str,
    path: &'a Path,
    similarity: f64,
    difference: f64,
    comparisons: &'a [Candidate],
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize JSON report")?;
    println!("{out}");
    Ok(())
}

fn success<T: Serialize>(body: &T) -> Result<()> {
    print(&Success {
        success: true,
        body,
    })
}

pub fn comparison_value(result: &ComparisonResult, diff_path: Option<&Path>) -> Result<serde_json::Value> {
    let body = Comparison { result, diff_path };
    serde_json::to_value(Success {
        success: true,
        body: &body,
    })
    .context("Failed to serialize JSON report")
}

pub fn print_comparison(result: &ComparisonResult, diff_path: Option<&Path>) -> Result<()> {
    let value = comparison_value(result, diff_path)?;
    print(&value)
}

pub fn print_failure(error: &str) -> Result<()> {
    print(&Failure {
        success: false,
        error,
    })
}

pub fn print_best_match(result: &SearchResult) -> Result<()> {
    let best = result.best();
    success(&BestMatch {
        image: &best.name,
        path: &best.path,
        similarity: best.similarity,
        difference: best.difference,
        comparisons: result.comparisons(),
    })
}

pub fn print_top(top: &TopMatches) -> Result<()> {
    success(top)
}

pub fn print_above(above: &ThresholdMatches) -> Result<()> {
    success(above)
}
