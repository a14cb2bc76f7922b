//! Human-readable rendering of classification decisions.
//!
//! Renders a single decision as a grouped, labelled card and batch results
//! as aligned one-line summaries.

use spendlens_core::Decision;

/// Print one decision as a vertical card: outcome first, then the per-tier
/// trace in cascade order.
pub fn print_decision(decision: &Decision) {
    row("category", &decision.category);
    row("confidence", &format!("{:.1}%", decision.confidence * 100.0));
    row("strategy", decision.strategy.as_str());
    row("clean", &decision.trace.clean_text);

    if let Some(rule) = &decision.trace.rule {
        row(
            "rule",
            &format!(
                "{} {:.2} [{}]",
                rule.category,
                rule.confidence,
                rule.matched_terms.join(", ")
            ),
        );
    }
    if let Some(ml) = &decision.trace.ml {
        row("ml", &format!("{} {:.2}", ml.category, ml.confidence));
    }
    if let Some(embed) = &decision.trace.embedding {
        row("embed", &format!("{} {:.2}", embed.category, embed.similarity));
    }
}

/// One line per batch item: `category  confidence  strategy  text`.
pub fn print_summary_line(text: &str, decision: &Decision) {
    println!(
        "{:<16} {:>6.1}%  {:<14} {}",
        decision.category,
        decision.confidence * 100.0,
        decision.strategy.as_str(),
        text
    );
}

fn row(label: &str, value: &str) {
    println!("{label:<10} {value}");
}
