use std::path::PathBuf;

use vitrine::config;
use vitrine::extract::CardLayout;
use vitrine::fetch::Fetcher;
use vitrine::paths::SitePaths;
use vitrine::pipeline;

fn main() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_help();
        return Ok(());
    }

    let mut base_dir: Option<PathBuf> = None;
    let mut site = "all".to_string();
    let mut dry_run = false;
    let mut limit: Option<usize> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--base-dir" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| "--base-dir requires a value".to_string())?;
                base_dir = Some(PathBuf::from(v));
            }
            "--site" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| "--site requires a value".to_string())?;
                match v.as_str() {
                    "newsletter" | "strip" | "all" => site = v.to_string(),
                    other => {
                        return Err(format!(
                            "unknown site: {other} (expected newsletter, strip or all)"
                        ))
                    }
                }
            }
            "--limit" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| "--limit requires a value".to_string())?;
                let parsed: usize = v
                    .parse()
                    .map_err(|_| format!("--limit expects a number, got {v}"))?;
                limit = Some(parsed);
            }
            "--dry-run" => dry_run = true,
            other => return Err(format!("unknown arg: {other} (try --help)")),
        }
        i += 1;
    }

    let base_dir = base_dir
        .or_else(|| std::env::current_dir().ok())
        .ok_or_else(|| "could not determine base dir; pass --base-dir".to_string())?;

    let paths = SitePaths::new(SitePaths::normalize_base_dir(&base_dir));
    paths.ensure_dirs().map_err(|e| e.to_string())?;

    let mut settings = config::load_refresh_settings(&paths).map_err(|e| e.to_string())?;
    if let Some(limit) = limit {
        settings.newsletter.limit = limit.clamp(1, settings.newsletter.anchor_tags.len());
    }

    let fetcher = Fetcher::new(
        &settings.user_agent,
        std::time::Duration::from_secs(settings.timeout_secs),
    );

    let log_line = |level: &str, event: &str, fields: serde_json::Value| -> vitrine::Result<()> {
        println!("[{level}] {event} {fields}");
        Ok(())
    };

    if site == "newsletter" || site == "all" {
        let summary = pipeline::refresh_newsletter(
            &fetcher,
            &paths,
            &settings,
            &CardLayout::newsletter(),
            dry_run,
            log_line,
        )
        .map_err(|e| e.to_string())?;
        println!(
            "newsletter: {} items, {} images saved, {} skipped, readme_changed={}",
            summary.items.len(),
            summary.images_saved,
            summary.images_skipped,
            summary.readme_changed
        );
    }

    if site == "strip" || site == "all" {
        let summary = pipeline::refresh_strip(&fetcher, &paths, &settings, dry_run, log_line)
            .map_err(|e| e.to_string())?;
        println!(
            "strip: post={} image_saved={} readme_changed={}",
            summary.post_url, summary.image_saved, summary.readme_changed
        );
    }

    Ok(())
}

fn print_help() {
    println!("vitrine_refresh - refresh README showcase regions from remote sites");
    println!();
    println!("USAGE:");
    println!("  vitrine_refresh [--base-dir DIR] [--site newsletter|strip|all] [--limit N] [--dry-run]");
    println!();
    println!("OPTIONS:");
    println!("  --base-dir DIR   directory holding README.md and assets/ (default: cwd)");
    println!("  --site SITE      which pipeline to run (default: all)");
    println!("  --limit N        newsletter items to extract (default from settings)");
    println!("  --dry-run        extract and log, but write nothing");
    println!("  -h, --help       show this help");
}
