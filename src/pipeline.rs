use crate::config::RefreshSettings;
use crate::extract::{extract_feed_items, CardLayout, FeedItem};
use crate::fetch::Fetcher;
use crate::normalize::{normalize, STORED_EXTENSIONS};
use crate::patch::{patch_region, AnchorBlock};
use crate::paths::SitePaths;
use crate::sniff;
use crate::strip;
use crate::{Result, VitrineError};
use scraper::Html;
use serde::Serialize;
use std::path::Path;
use url::Url;

#[derive(Debug, Clone, Serialize)]
pub struct NewsletterSummary {
    pub items: Vec<FeedItem>,
    pub images_saved: usize,
    pub images_skipped: usize,
    pub readme_changed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StripSummary {
    pub post_url: String,
    pub image_url: String,
    pub image_saved: bool,
    pub readme_changed: bool,
}

/// Refresh the newsletter showcase: fetch the index page, extract the
/// newest items, download and normalize their covers, then patch one
/// anchor region per item. Per-item image failures are logged and
/// contained; index fetch, extraction coming up empty, missing anchors
/// and README writes are fatal. `dry_run` suppresses every write.
pub fn refresh_newsletter<FLog>(
    fetcher: &Fetcher,
    paths: &SitePaths,
    settings: &RefreshSettings,
    layout: &CardLayout,
    dry_run: bool,
    mut log_line: FLog,
) -> Result<NewsletterSummary>
where
    FLog: FnMut(&str, &str, serde_json::Value) -> Result<()>,
{
    let index_url = &settings.newsletter.index_url;
    let html = fetcher.get_text(index_url)?;
    let document = Html::parse_document(&html);

    let items = extract_feed_items(&document, layout, settings.newsletter.limit)?;
    if items.is_empty() {
        return Err(VitrineError::Extraction(format!(
            "index page yielded no items: {index_url}"
        )));
    }
    log_line(
        "info",
        "newsletter_items_extracted",
        serde_json::json!({ "count": items.len(), "url": index_url }),
    )?;

    let mut images_saved = 0_usize;
    let mut images_skipped = 0_usize;
    for (idx, item) in items.iter().enumerate() {
        let Some(stem_name) = settings.newsletter.asset_stems.get(idx) else {
            break;
        };
        if item.image_url.is_empty() {
            images_skipped += 1;
            log_line(
                "warn",
                "newsletter_item_without_image_url",
                serde_json::json!({ "title": item.title, "stem": stem_name }),
            )?;
            continue;
        }

        if store_cover(fetcher, paths, stem_name, &item.image_url, dry_run, &mut log_line)? {
            images_saved += 1;
        } else {
            images_skipped += 1;
        }
    }

    let readme_path = paths.readme_path();
    let mut readme = std::fs::read_to_string(&readme_path)?;
    let mut readme_changed = false;
    for (idx, item) in items.iter().enumerate() {
        let (Some(stem_name), Some(tag)) = (
            settings.newsletter.asset_stems.get(idx),
            settings.newsletter.anchor_tags.get(idx),
        ) else {
            break;
        };
        let asset_file = resolve_stored_asset(&paths.assets_dir(), stem_name);
        let fragment = newsletter_fragment(item, &paths.asset_rel_ref(&asset_file));
        let anchor = AnchorBlock::new(tag.clone());
        let (patched, changed) = patch_region(&readme, &anchor, &fragment)?;
        readme = patched;
        readme_changed |= changed;
    }
    if readme_changed && !dry_run {
        std::fs::write(&readme_path, &readme)?;
    }
    log_line(
        "info",
        "newsletter_readme_patched",
        serde_json::json!({
            "changed": readme_changed,
            "dry_run": dry_run,
            "path": readme_path.to_string_lossy(),
        }),
    )?;

    Ok(NewsletterSummary {
        items,
        images_saved,
        images_skipped,
        readme_changed,
    })
}

/// Refresh the daily-strip showcase: resolve the latest post from the
/// home page, pick its strip image, normalize it and patch the strip
/// anchor. Image download/normalization failures are contained; the
/// anchor is still patched with whatever asset resolution yields.
pub fn refresh_strip<FLog>(
    fetcher: &Fetcher,
    paths: &SitePaths,
    settings: &RefreshSettings,
    dry_run: bool,
    mut log_line: FLog,
) -> Result<StripSummary>
where
    FLog: FnMut(&str, &str, serde_json::Value) -> Result<()>,
{
    let home_url = &settings.strip.home_url;
    let home_html = fetcher.get_text(home_url)?;
    let home_doc = Html::parse_document(&home_html);
    let post_url = strip::find_latest_post_url(&home_doc, home_url)?;

    let post_html = fetcher.get_text(&post_url)?;
    let post_doc = Html::parse_document(&post_html);
    let image_url = strip::find_strip_image_url(&post_doc, &post_url)?;
    log_line(
        "info",
        "strip_post_resolved",
        serde_json::json!({ "post_url": post_url, "image_url": image_url }),
    )?;

    let stem_name = &settings.strip.asset_stem;
    let image_saved =
        store_cover(fetcher, paths, stem_name, &image_url, dry_run, &mut log_line)?;

    let readme_path = paths.readme_path();
    let readme = std::fs::read_to_string(&readme_path)?;
    let asset_file = resolve_stored_asset(&paths.assets_dir(), stem_name);
    let fragment = strip_fragment(&post_url, &paths.asset_rel_ref(&asset_file), home_url);
    let anchor = AnchorBlock::new(settings.strip.anchor_tag.clone());
    let (patched, readme_changed) = patch_region(&readme, &anchor, &fragment)?;
    if readme_changed && !dry_run {
        std::fs::write(&readme_path, &patched)?;
    }
    log_line(
        "info",
        "strip_readme_patched",
        serde_json::json!({ "changed": readme_changed, "dry_run": dry_run }),
    )?;

    Ok(StripSummary {
        post_url,
        image_url,
        image_saved,
        readme_changed,
    })
}

// Fetch, sniff and persist one cover image. Returns whether a usable
// image was stored; every failure in here is contained to this asset.
fn store_cover<FLog>(
    fetcher: &Fetcher,
    paths: &SitePaths,
    stem_name: &str,
    image_url: &str,
    dry_run: bool,
    log_line: &mut FLog,
) -> Result<bool>
where
    FLog: FnMut(&str, &str, serde_json::Value) -> Result<()>,
{
    let body = match fetcher.get(image_url) {
        Ok(body) => body,
        Err(err) => {
            log_line(
                "warn",
                "cover_download_failed",
                serde_json::json!({ "url": image_url, "error": err.to_string() }),
            )?;
            return Ok(false);
        }
    };

    let detected = sniff::detect(&body.bytes);
    if dry_run {
        log_line(
            "info",
            "cover_store_skipped_dry_run",
            serde_json::json!({
                "stem": stem_name,
                "detected_format": detected.as_str(),
                "declared_content_type": body.content_type,
            }),
        )?;
        return Ok(false);
    }

    match normalize(&body.bytes, detected, &paths.asset_stem(stem_name), true) {
        Ok(stored) => {
            log_line(
                "info",
                "cover_stored",
                serde_json::json!({
                    "path": stored.path.to_string_lossy(),
                    "format": stored.format.as_str(),
                    "declared_content_type": body.content_type,
                }),
            )?;
            Ok(true)
        }
        Err(err) => {
            log_line(
                "warn",
                "cover_store_failed",
                serde_json::json!({ "stem": stem_name, "error": err.to_string() }),
            )?;
            Ok(false)
        }
    }
}

/// Probe the fixed extension order and return the file name that
/// actually exists for `stem`, defaulting to `.jpg`, so the emitted
/// README reference is never dangling for an extension reason.
pub fn resolve_stored_asset(assets_dir: &Path, stem: &str) -> String {
    for ext in STORED_EXTENSIONS {
        let candidate = assets_dir.join(format!("{stem}.{ext}"));
        if candidate.exists() {
            return format!("{stem}.{ext}");
        }
    }
    format!("{stem}.jpg")
}

fn newsletter_fragment(item: &FeedItem, image_rel: &str) -> String {
    format!(
        "<span style=\"font-size: 1.13em; color: inherit;\">{title}</span><br>\n\
         <a\n   href=\"{link}\"\n   title=\"{title}\"\n>\n\
         <img\n   src=\"{image_rel}\"\n   alt=\"{title}\"\n   width=\"55%\"\n/>\n\
         </a>\n<br/>",
        title = item.title,
        link = item.link,
        image_rel = image_rel,
    )
}

fn strip_fragment(post_url: &str, image_rel: &str, home_url: &str) -> String {
    let source_label = Url::parse(home_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| home_url.to_string());
    format!(
        "<a href=\"{post_url}\">\n  <img src=\"{image_rel}\" alt=\"Daily strip\" width=\"50%\" />\n</a>\n\
         <br/>\n<sub>Source: <a href=\"{home_url}\">{source_label}</a></sub>"
    )
}
