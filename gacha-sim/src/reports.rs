use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use crate::batch::BatchSummary;

pub fn generate_console_report(
    out: &mut dyn Write,
    summary: &BatchSummary,
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Gacha Simulation Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "===========================".cyan())?;

    let seeds: Vec<String> = summary.seeds.iter().map(u64::to_string).collect();
    writeln!(out, "Seeds: {}", seeds.join(", "))?;
    writeln!(out, "Runs: {}", summary.runs)?;
    writeln!(
        out,
        "Goals achieved: {} ({:.1}%)",
        summary.goals_achieved.to_string().green(),
        summary.goal_rate * 100.0
    )?;
    writeln!(
        out,
        "Money spent: mean {:.2} (σ {:.2}), min {:.2}, max {:.2}",
        summary.mean_spent, summary.std_spent, summary.min_spent, summary.max_spent
    )?;
    writeln!(out, "Draws per run: {:.2}", summary.mean_draws)?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    writeln!(out, "{}", "🎲 Item Frequency".bright_yellow().bold())?;
    writeln!(out, "{}", "=================".yellow())?;
    if summary.item_frequency.is_empty() {
        writeln!(out, "No items drawn.")?;
    }
    for (item_id, count) in &summary.item_frequency {
        writeln!(
            out,
            "   Item {item_id:>6}: {count:>8} ({:.2}%)",
            summary.item_share(*item_id) * 100.0
        )?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, summary: &BatchSummary) -> Result<()> {
    let json_output = serde_json::to_string_pretty(summary)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, summary: &BatchSummary) -> Result<()> {
    writeln!(out, "# Gacha Simulation Results\n")?;

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Runs**: {}", summary.runs)?;
    writeln!(
        out,
        "- **Goals achieved**: {} ({:.1}%)",
        summary.goals_achieved,
        summary.goal_rate * 100.0
    )?;
    writeln!(out, "- **Mean spent**: {:.2}", summary.mean_spent)?;
    writeln!(
        out,
        "- **Spent range**: {:.2} - {:.2}",
        summary.min_spent, summary.max_spent
    )?;
    writeln!(out, "- **Mean draws**: {:.2}\n", summary.mean_draws)?;

    writeln!(out, "## Item Frequency\n")?;
    if summary.item_frequency.is_empty() {
        writeln!(out, "_No items drawn._")?;
        return Ok(());
    }
    writeln!(out, "| Item | Count | Share |")?;
    writeln!(out, "|-----:|------:|------:|")?;
    for (item_id, count) in &summary.item_frequency {
        writeln!(
            out,
            "| {item_id} | {count} | {:.2}% |",
            summary.item_share(*item_id) * 100.0
        )?;
    }
    Ok(())
}
