use std::path::Path;
use std::time::Duration;

use imgmatch::{Candidate, ComparisonResult};

pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Print the outcome of a single comparison.
pub fn print_comparison(
    first: &Path,
    second: &Path,
    result: &ComparisonResult,
    saved_diff: Option<&Path>,
    elapsed: Duration,
) {
    let time_suffix = format!("  \x1b[2m{}\x1b[0m", format_duration(elapsed));
    let pair = format!("{} vs {}", file_label(first), file_label(second));
    let detail = format!(
        "{:.2}%, {} / {} pixels",
        result.difference_percent, result.differing_pixels, result.total_pixels
    );

    if result.visually_equal {
        println!("  \x1b[32mEQUAL\x1b[0m  {pair}  ({detail}){time_suffix}");
    } else {
        println!("  \x1b[31m DIFF\x1b[0m  {pair}  ({detail}){time_suffix}");
    }
    if result.resized {
        println!(
            "         \x1b[2msecond image resized to {}x{}\x1b[0m",
            result.width, result.height
        );
    }
    if let Some(path) = saved_diff {
        println!("         diff image saved to {}", path.display());
    }
}

/// Print an error line for a failed operation.
pub fn print_error_line(name: &str, msg: &str) {
    println!("  \x1b[31m  ERR\x1b[0m  {name}  ({msg})");
}

/// Print ranked candidates, best first.
pub fn print_ranking(candidates: &[Candidate]) {
    let name_width = candidates
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(8)
        .clamp(8, 50);

    for (i, c) in candidates.iter().enumerate() {
        let rank = i + 1;
        let similarity = format_similarity(c.similarity);
        let line = format!(
            "{rank:>4}. {:<width$}  {similarity}  \x1b[2m({} pixels differ)\x1b[0m",
            truncate_name(&c.name, name_width),
            c.differing_pixels,
            width = name_width,
        );
        println!("{line}");
    }
}

/// Similarity with a color band: green from 90%, yellow from 50%, red below.
fn format_similarity(similarity: f64) -> String {
    let color = if similarity >= 90.0 {
        "32"
    } else if similarity >= 50.0 {
        "33"
    } else {
        "31"
    };
    format!("\x1b[{color}m{similarity:>6.2}%\x1b[0m")
}

/// Print the best match headline.
pub fn print_best_match(best: &Candidate) {
    println!();
    println!(
        "Best match: \x1b[1m{}\x1b[0m  ({:.2}% similar, {:.2}% different)",
        best.name, best.similarity, best.difference
    );
    println!("            {}", best.path.display());
}

/// Print the final search summary.
pub fn print_search_summary(shown: usize, total: usize, corpus: &Path, elapsed: Duration) {
    println!();
    println!(
        "Images:  {shown} shown, {total} compared in {}",
        corpus.display()
    );
    println!("Time:    {}", format_duration(elapsed));
}

/// Truncate a name to `max` chars, keeping the tail (extension included).
fn truncate_name(name: &str, max: usize) -> String {
    let len = name.chars().count();
    if len <= max {
        name.to_string()
    } else {
        let skip = len - (max - 1);
        let truncated: String = name.chars().skip(skip).collect();
        format!("\u{2026}{truncated}")
    }
}
