//! CLI command implementations

use std::sync::Arc;

use streamline_backend::{create_backend, history_layout, HistoryAggregator, VcsBackend};
use streamline_core::{
    group_annotations, AnnotatedLine, DiffLine, DiffLineKind, DiffReconciler, LaneLayout, StreamlineConfig,
};
use streamline_server::StreamlineServer;

fn backend(config: &StreamlineConfig) -> anyhow::Result<Arc<dyn VcsBackend>> {
    Ok(Arc::from(create_backend(&config.backend)?))
}

pub async fn diff(config: &StreamlineConfig, change: u64) -> anyhow::Result<()> {
    let backend = backend(config)?;
    let description = backend.describe_changelist(change).await?;
    let reconciled = DiffReconciler::new(&config.diff).reconcile_detailed(&description.diff_text);

    println!(
        "Change {} by {} {}",
        description.info.number,
        description.info.author,
        format_time(description.info.timestamp)
    );
    println!("    {}", description.info.summary());
    println!();
    print!("{}", render_diff(&reconciled.lines));

    let stats = reconciled.stats;
    tracing::info!(
        "{} files, {} hunks, +{} -{} ({} cosmetic lines hidden)",
        stats.files,
        stats.hunks,
        stats.additions,
        stats.deletions,
        stats.suppressed
    );
    Ok(())
}

pub async fn graph(config: &StreamlineConfig, stream: &str, force_virtual: bool) -> anyhow::Result<()> {
    let aggregator = HistoryAggregator::new(backend(config)?, config.history);
    let history = aggregator.aggregate(stream).await?;
    for failed in &history.failed_branches {
        tracing::warn!("History of {} is missing", failed);
    }

    let layout = history_layout(&history, force_virtual, &config.lanes);
    print!("{}", render_graph(&layout));
    Ok(())
}

pub async fn annotate(config: &StreamlineConfig, path: &str) -> anyhow::Result<()> {
    let result = backend(config)?.annotate_file(path).await?;
    if !result.success {
        anyhow::bail!(
            "annotate {} failed: {}",
            path,
            result.message.as_deref().unwrap_or("unknown error")
        );
    }

    tracing::debug!("{} blame blocks", group_annotations(&result.lines).len());
    print!("{}", render_annotate(&result.lines));
    Ok(())
}

pub async fn serve(config: StreamlineConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Streamline server on {}:{}", config.server.host, config.server.port);
    let backend = backend(&config)?;
    StreamlineServer::new(backend, config).start().await
}

fn format_time(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|time| time.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn render_diff(lines: &[DiffLine]) -> String {
    let number = |n: Option<u32>| n.map_or_else(String::new, |n| n.to_string());
    let mut out = String::new();
    for line in lines {
        let row = match line.kind {
            DiffLineKind::FileHeader => format!("{}\n", line.content),
            DiffLineKind::Hunk => format!("{}\n", line.content),
            DiffLineKind::Context => format!(
                "{:>5} {:>5}   {}\n",
                number(line.old_line_number),
                number(line.new_line_number),
                line.content
            ),
            DiffLineKind::Add => format!("{:>5} {:>5} + {}\n", "", number(line.new_line_number), line.content),
            DiffLineKind::Delete => format!("{:>5} {:>5} - {}\n", number(line.old_line_number), "", line.content),
        };
        out.push_str(&row);
    }
    out
}

fn render_graph(layout: &LaneLayout) -> String {
    let width = layout.max_lane_index + 1;
    let mut out = String::new();

    for node in &layout.nodes {
        let lanes: String = (0..width)
            .map(|lane| if lane == node.lane { '*' } else { '.' })
            .collect();
        out.push_str(&format!(
            "{lanes}  {:>7}  {:<12} {}  {}\n",
            node.commit.number,
            node.commit.author,
            format_time(node.commit.timestamp),
            node.commit.summary()
        ));
    }

    let mode = if layout.is_virtual { "authors" } else { "streams" };
    out.push_str(&format!("\nlanes by {mode}:\n"));
    for lane in &layout.lanes {
        out.push_str(&format!(
            "  {:>2}  {:<24} {} commits\n",
            lane.index, lane.label, lane.commit_count
        ));
    }
    out
}

fn render_annotate(lines: &[AnnotatedLine]) -> String {
    lines
        .iter()
        .map(|line| {
            format!(
                "{:>7} {:<12} {:>5}: {}\n",
                line.commit_number, line.author, line.line_number, line.content
            )
        })
        .collect()
}
