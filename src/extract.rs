use crate::{Result, VitrineError};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

/// One item lifted off the index page. `image_url` may be empty; the
/// download step skips such items without failing the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub image_url: String,
}

/// One positional step below a card: the `index`-th (1-based) direct
/// child element with the given tag name.
#[derive(Debug, Clone)]
pub struct ChildStep {
    pub tag: String,
    pub index: usize,
}

/// Declarative description of the index page's current markup. The
/// site has no stable API, so the positional paths here are brittle by
/// design; layout drift means swapping this value, not the extraction
/// code.
#[derive(Debug, Clone)]
pub struct CardLayout {
    /// Site origin used to absolutize root-relative links.
    pub origin: String,
    /// CSS path selecting the candidate list nodes.
    pub item_selector: String,
    /// Heading selectors tried in order for the title (specific first).
    pub heading_selectors: Vec<String>,
    /// A link whose href contains one of these wins over the first link.
    pub link_markers: Vec<String>,
    /// Positional path from the list node to the cover image element.
    pub image_child_path: Vec<ChildStep>,
    /// Lazy-load attributes tried in order when `src` is empty.
    pub lazy_src_attrs: Vec<String>,
}

impl CardLayout {
    /// Layout of the newsletter index as currently served.
    pub fn newsletter() -> Self {
        Self {
            origin: "https://www.linkedin.com".to_string(),
            item_selector:
                "#main-content > section:nth-of-type(1) > div > section:nth-of-type(3) > ul > li"
                    .to_string(),
            heading_selectors: vec!["h3".to_string(), "h2".to_string()],
            link_markers: vec!["newsletters".to_string(), "feed/update".to_string()],
            image_child_path: vec![
                ChildStep { tag: "div".to_string(), index: 1 },
                ChildStep { tag: "div".to_string(), index: 2 },
                ChildStep { tag: "img".to_string(), index: 1 },
            ],
            lazy_src_attrs: vec![
                "data-delayed-url".to_string(),
                "data-src".to_string(),
                "data-img-src".to_string(),
            ],
        }
    }
}

/// Walk the index document and yield up to `limit` feed items.
/// Candidates without a usable title or link are skipped and do not
/// count toward `limit`.
pub fn extract_feed_items(
    document: &Html,
    layout: &CardLayout,
    limit: usize,
) -> Result<Vec<FeedItem>> {
    let item_selector = Selector::parse(&layout.item_selector).map_err(|e| {
        VitrineError::Extraction(format!("bad item selector {:?}: {e}", layout.item_selector))
    })?;
    let anchor_selector = Selector::parse("a[href]").expect("anchor selector");

    let mut items = Vec::new();
    for node in document.select(&item_selector) {
        if items.len() >= limit {
            break;
        }

        let card = first_child_element(&node, "div").unwrap_or(node);

        let Some(title) = card_title(&card, layout) else {
            continue;
        };

        let Some(link) = card_link(&card, &anchor_selector, layout) else {
            continue;
        };

        let image_url = cover_image_url(&node, layout).unwrap_or_default();

        items.push(FeedItem {
            title,
            link,
            image_url,
        });
    }

    Ok(items)
}

fn card_title(card: &ElementRef<'_>, layout: &CardLayout) -> Option<String> {
    for raw in &layout.heading_selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        let text: String = card
            .select(&selector)
            .flat_map(|heading| heading.text())
            .collect();
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    None
}

fn card_link(
    card: &ElementRef<'_>,
    anchor_selector: &Selector,
    layout: &CardLayout,
) -> Option<String> {
    let hrefs: Vec<&str> = card
        .select(anchor_selector)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .collect();

    let preferred = hrefs
        .iter()
        .find(|href| layout.link_markers.iter().any(|marker| href.contains(marker.as_str())));
    let link = preferred.or(hrefs.first())?;

    let absolute = if link.starts_with('/') {
        format!("{}{}", layout.origin, link)
    } else {
        (*link).to_string()
    };

    // The item is discarded unless the link carries scheme and host.
    let parsed = Url::parse(&absolute).ok()?;
    parsed.host_str()?;
    Some(absolute)
}

fn cover_image_url(node: &ElementRef<'_>, layout: &CardLayout) -> Option<String> {
    let mut current = *node;
    for step in &layout.image_child_path {
        current = nth_child_element(&current, &step.tag, step.index)?;
    }

    let primary = current.value().attr("src").map(str::trim).unwrap_or("");
    if !primary.is_empty() {
        return Some(primary.to_string());
    }
    for attr in &layout.lazy_src_attrs {
        let value = current.value().attr(attr).map(str::trim).unwrap_or("");
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }
    None
}

fn first_child_element<'a>(node: &ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    nth_child_element(node, tag, 1)
}

fn nth_child_element<'a>(node: &ElementRef<'a>, tag: &str, index: usize) -> Option<ElementRef<'a>> {
    node.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == tag)
        .nth(index.checked_sub(1)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_page(items: &str) -> Html {
        Html::parse_document(&format!(
            r#"<html><body><div id="main-content">
                 <section>
                   <div>
                     <section>hero</section>
                     <section>about</section>
                     <section><ul>{items}</ul></section>
                   </div>
                 </section>
               </div></body></html>"#
        ))
    }

    fn full_item(title_tag: &str, title: &str, img_attr: &str) -> String {
        format!(
            r#"<li><div>
                 <{title_tag}>{title}</{title_tag}>
                 <a href="https://www.linkedin.com/login">Sign in</a>
                 <a href="/feed/update/urn:li:activity:42">Read</a>
                 <a href="https://example.com/elsewhere">Other</a>
                 <div>meta</div>
                 <div><img {img_attr} alt="cover"/></div>
               </div></li>"#
        )
    }

    #[test]
    fn extracts_two_items_with_lazy_loaded_covers() {
        let items = format!(
            "{}{}",
            full_item("h3", "First post", r#"src="" data-src="https://cdn.example.com/a.png""#),
            full_item("h3", "Second post", r#"data-src="https://cdn.example.com/b.png""#),
        );
        let doc = index_page(&items);
        let out = extract_feed_items(&doc, &CardLayout::newsletter(), 2).expect("items");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "First post");
        assert_eq!(out[0].link, "https://www.linkedin.com/feed/update/urn:li:activity:42");
        assert_eq!(out[0].image_url, "https://cdn.example.com/a.png");
        assert_eq!(out[1].image_url, "https://cdn.example.com/b.png");
    }

    #[test]
    fn h2_heading_is_accepted_when_h3_is_absent() {
        let doc = index_page(&full_item("h2", "Fallback title", r#"src="x.png""#));
        let out = extract_feed_items(&doc, &CardLayout::newsletter(), 2).expect("items");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Fallback title");
    }

    #[test]
    fn card_without_heading_is_skipped_and_does_not_consume_limit() {
        let items = format!(
            r#"<li><div><a href="/feed/update/1">no heading</a></div></li>{}"#,
            full_item("h3", "Real item", r#"src="x.png""#)
        );
        let doc = index_page(&items);
        let out = extract_feed_items(&doc, &CardLayout::newsletter(), 1).expect("items");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Real item");
    }

    #[test]
    fn root_relative_link_is_absolutized_and_absolute_passes_through() {
        let relative = full_item("h3", "Relative", r#"src="x.png""#);
        let absolute = r#"<li><div>
             <h3>Absolute</h3>
             <a href="https://www.linkedin.com/newsletters/some-issue">Read</a>
           </div></li>"#;
        let doc = index_page(&format!("{relative}{absolute}"));
        let out = extract_feed_items(&doc, &CardLayout::newsletter(), 2).expect("items");
        assert_eq!(out[0].link, "https://www.linkedin.com/feed/update/urn:li:activity:42");
        assert_eq!(out[1].link, "https://www.linkedin.com/newsletters/some-issue");
    }

    #[test]
    fn content_marker_link_wins_over_first_anchor() {
        let doc = index_page(&full_item("h3", "Pick the right link", r#"src="x.png""#));
        let out = extract_feed_items(&doc, &CardLayout::newsletter(), 1).expect("items");
        // The login link comes first in the card; the feed/update link wins.
        assert!(out[0].link.contains("/feed/update/"));
    }

    #[test]
    fn card_without_any_link_is_rejected() {
        let doc = index_page("<li><div><h3>Linkless</h3></div></li>");
        let out = extract_feed_items(&doc, &CardLayout::newsletter(), 1).expect("items");
        assert!(out.is_empty());
    }

    #[test]
    fn missing_image_node_keeps_item_with_empty_url() {
        let doc = index_page(
            r#"<li><div>
                 <h3>No cover</h3>
                 <a href="/feed/update/7">Read</a>
               </div></li>"#,
        );
        let out = extract_feed_items(&doc, &CardLayout::newsletter(), 1).expect("items");
        assert_eq!(out.len(), 1);
        assert!(out[0].image_url.is_empty());
    }
}
