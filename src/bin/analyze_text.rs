use ai_detector_client::{
    init_logging, merge_segments, partition_text, ApiClient, ClientConfig, SessionStore, TextRun,
};
use anyhow::Context;
use std::io::Read;

fn preview(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        out.push_str("...");
    }
    out.replace('\n', " ")
}

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage:\n  analyze_text <path.txt|-> --email <email> --password <password> [--register] [--base-url <url>] [--history <n>] [--stats] [--export csv|pdf] [--out-dir <dir>]\n\nNotes:\n  - `-` reads the text to analyze from stdin.\n  - Base URL defaults to AIDETECTOR_API_BASE_URL or http://127.0.0.1:8000."
        );
        return Ok(());
    }

    init_logging();

    let path = args[1].clone();
    let email = parse_arg_value(&args, "--email").context("--email is required")?;
    let password = parse_arg_value(&args, "--password").context("--password is required")?;
    let register = has_flag(&args, "--register");
    let history_n: Option<usize> =
        parse_arg_value(&args, "--history").and_then(|s| s.parse().ok());
    let show_stats = has_flag(&args, "--stats");
    let export = parse_arg_value(&args, "--export");
    let out_dir = parse_arg_value(&args, "--out-dir").unwrap_or_else(|| ".".to_string());

    let text = if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read stdin failed")?;
        buf
    } else {
        std::fs::read_to_string(&path).with_context(|| format!("read file failed: {}", path))?
    };

    let config = match parse_arg_value(&args, "--base-url") {
        Some(url) => ClientConfig::new(url),
        None => ClientConfig::from_env(),
    };
    println!("Endpoint: {}", config.base_url);

    let session = SessionStore::new();
    let client = ApiClient::new(config, session).with_session_expired_hook(|| {
        eprintln!("Session expired, please log in again.");
    });

    let health = client.health().await.context("health probe failed")?;
    println!("Service: {}", health.status);

    if register {
        client
            .register(&email, &password)
            .await
            .context("register failed")?;
    } else {
        client.login(&email, &password).await.context("login failed")?;
    }
    let profile = client.me().await.context("profile fetch failed")?;
    println!("Logged in as: {}", profile.email);

    let result = client.analyze(&text).await.context("analyze failed")?;
    println!(
        "Verdict: {} (prob_ai={:.3}, threshold={:.2})",
        if result.is_ai() { "AI-generated" } else { "human-written" },
        result.prob_ai,
        result.threshold
    );

    let merged = merge_segments(&result.segments, text.len());
    println!("Flagged spans: {}", merged.len());
    for run in partition_text(&text, &merged) {
        if let TextRun::Flagged { text, prob_ai } = run {
            println!("  [{:.2}] {}", prob_ai, preview(text, 80));
        }
    }

    if let Some(n) = history_n {
        let items = client.list_analyses(n).await.context("history fetch failed")?;
        println!("Recent analyses ({}):", items.len());
        for item in items {
            println!(
                "  #{} {} label={} prob={:.3} {}",
                item.id,
                item.created_at.format("%Y-%m-%d %H:%M"),
                item.label_pred,
                item.prob_ai,
                preview(&item.preview, 60)
            );
        }
    }

    if show_stats {
        let stats = client.stats().await.context("stats fetch failed")?;
        println!(
            "Totals: {} analyses ({} AI / {} human), avg prob_ai {:.3}",
            stats.total_count, stats.ai_count, stats.human_count, stats.avg_prob_ai
        );
    }

    if let Some(format) = export {
        let download = match format.as_str() {
            "csv" => client.export_csv().await.context("csv export failed")?,
            "pdf" => client.export_pdf().await.context("pdf export failed")?,
            other => anyhow::bail!("unknown export format: {}", other),
        };
        let out_path = std::path::Path::new(&out_dir).join(&download.filename);
        std::fs::write(&out_path, &download.bytes)
            .with_context(|| format!("write export failed: {}", out_path.display()))?;
        println!("Exported {} ({} bytes)", out_path.display(), download.bytes.len());
    }

    Ok(())
}
