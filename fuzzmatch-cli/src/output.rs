//! Terminal rendering of job state and results

use colored::*;
use fuzzmatch_core::domain::result::JobResult;
use fuzzmatch_core::domain::state::{JobPhase, JobState};

/// Print a status snapshot
pub fn print_state(state: &JobState) {
    let phase = state.phase();

    println!("{}", "Job Status:".bold());
    println!("  Phase:     {}", colorize_phase(phase));
    if !state.progress.is_empty() {
        println!("  Progress:  {}", state.progress);
    }

    if let Some(started) = state.started_at {
        println!("  Started:   {}", started.format("%Y-%m-%d %H:%M:%S"));

        if let Some(completed) = state.completed_at {
            println!("  Completed: {}", completed.format("%Y-%m-%d %H:%M:%S"));
            let seconds = completed.signed_duration_since(started).num_seconds();
            println!("  Duration:  {}s", seconds);
        }
    }

    if let Some(results) = &state.results {
        println!();
        print_result_summary(results);
    }

    if let Some(error) = state.error.as_deref().filter(|e| !e.is_empty()) {
        println!();
        print_job_error(error);
    }
}

/// Print the summary of a finished job
pub fn print_result_summary(results: &JobResult) {
    let mode = if results.dry_run {
        "dry run".yellow()
    } else {
        "applied".green()
    };

    println!("{} ({})", "Results:".bold(), mode);
    println!("  Source records:   {}", results.total_source);
    println!("  Target records:   {}", results.total_target);
    println!(
        "  Matched:          {} ({:.1}%)",
        results.matched.to_string().green(),
        results.match_rate() * 100.0
    );
    println!("  Unmatched source: {}", results.unmatched_source);
    println!(
        "  Low confidence:   {}",
        if results.low_confidence_count > 0 {
            results.low_confidence_count.to_string().yellow()
        } else {
            results.low_confidence_count.to_string().normal()
        }
    );

    let stats = &results.confidence_stats;
    println!(
        "  Confidence:       avg {:.3}, min {:.3}, max {:.3}",
        stats.avg, stats.min, stats.max
    );

    if !results.tier_distribution.is_empty() {
        println!("\n{}", "Matches by tier:".bold());
        for (tier, count) in tier_rows(results) {
            println!("  Tier {:<3} {}", tier.cyan(), count);
        }
    }

    if results.report_handles().next().is_some() {
        println!("\n{}", "Reports:".bold());
        if let Some(handle) = &results.all_matches_file {
            println!("  All matches:    {}", handle.dimmed());
        }
        if let Some(handle) = &results.low_confidence_file {
            println!("  Low confidence: {}", handle.dimmed());
        }
    }

    if let Err(violation) = results.validate() {
        println!("\n{} {}", "⚠".yellow(), violation.to_string().yellow());
    }
}

/// Print a job failure verbatim
pub fn print_job_error(message: &str) {
    println!("{}", "Error:".bold());
    println!("{}", message.red());
}

/// Tier rows in numeric tier order; non-numeric tiers sort last
fn tier_rows(results: &JobResult) -> Vec<(&str, u64)> {
    let mut rows: Vec<(&str, u64)> = results
        .tier_distribution
        .iter()
        .map(|(tier, count)| (tier.as_str(), *count))
        .collect();
    rows.sort_by_key(|(tier, _)| (tier.parse::<u32>().unwrap_or(u32::MAX), *tier));
    rows
}

/// Colorize job phase for display
fn colorize_phase(phase: JobPhase) -> ColoredString {
    let name = phase.to_string();
    match phase {
        JobPhase::Idle => name.dimmed(),
        JobPhase::Starting => name.yellow(),
        JobPhase::Running => name.cyan(),
        JobPhase::Completed => name.green(),
        JobPhase::Failed => name.red(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuzzmatch_core::domain::result::ConfidenceStats;
    use std::collections::BTreeMap;

    #[test]
    fn test_tier_rows_sort_numerically() {
        let results = JobResult {
            total_source: 20,
            total_target: 20,
            matched: 12,
            unmatched_source: 8,
            tier_distribution: BTreeMap::from([
                ("10".to_string(), 1),
                ("2".to_string(), 5),
                ("1".to_string(), 4),
                ("manual".to_string(), 2),
            ]),
            confidence_stats: ConfidenceStats::default(),
            low_confidence_count: 0,
            all_matches_file: None,
            low_confidence_file: None,
            dry_run: true,
        };

        let tiers: Vec<&str> = tier_rows(&results).into_iter().map(|(t, _)| t).collect();
        assert_eq!(tiers, vec!["1", "2", "10", "manual"]);
    }
}
