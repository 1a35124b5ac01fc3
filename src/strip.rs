use crate::{Result, VitrineError};
use scraper::{Html, Selector};
use url::Url;

/// Href fragments that mark a link as pointing at a post page.
const POST_LINK_MARKERS: &[&str] = &["postagem.php?id=", "postagem", "post"];

/// Inline images whose URL contains one of these are decoration, not
/// the strip itself.
const DECORATIVE_MARKERS: &[&str] = &["icon", "logo", "sprite", "icone", "emoji"];

const INLINE_IMAGE_EXTS: &[&str] = &[".jpg", ".jpeg", ".png"];

/// Scan the home page for post links and return the first match as the
/// latest post (home pages list newest-first). Marker-matching anchors
/// win; any `id=` link is the fallback.
pub fn find_latest_post_url(document: &Html, home_url: &str) -> Result<String> {
    let base = Url::parse(home_url)
        .map_err(|_| VitrineError::InvalidUrl(home_url.to_string()))?;
    let anchor_selector = Selector::parse("a[href]").expect("anchor selector");

    let mut candidates: Vec<String> = Vec::new();
    for a in document.select(&anchor_selector) {
        let href = a.value().attr("href").map(str::trim).unwrap_or("");
        if href.is_empty() {
            continue;
        }
        if POST_LINK_MARKERS.iter().any(|marker| href.contains(marker)) {
            if let Ok(absolute) = base.join(href) {
                candidates.push(absolute.to_string());
            }
        }
    }

    if candidates.is_empty() {
        for a in document.select(&anchor_selector) {
            let href = a.value().attr("href").map(str::trim).unwrap_or("");
            if href.contains("id=") {
                if let Ok(absolute) = base.join(href) {
                    candidates.push(absolute.to_string());
                }
            }
        }
    }

    candidates
        .into_iter()
        .next()
        .ok_or_else(|| VitrineError::Extraction(format!("no post link found on {home_url}")))
}

/// Pick the strip image out of a post page: the first inline image with
/// an image extension and no decorative marker, else the social-preview
/// `og:image` meta. Relative sources are resolved against the post URL.
pub fn find_strip_image_url(document: &Html, post_url: &str) -> Result<String> {
    let base =
        Url::parse(post_url).map_err(|_| VitrineError::InvalidUrl(post_url.to_string()))?;
    let img_selector = Selector::parse("img").expect("img selector");

    for img in document.select(&img_selector) {
        let src = img.value().attr("src").map(str::trim).unwrap_or("");
        if src.is_empty() {
            continue;
        }
        let lower = src.to_ascii_lowercase();
        if !INLINE_IMAGE_EXTS.iter().any(|ext| lower.contains(ext)) {
            continue;
        }
        if DECORATIVE_MARKERS.iter().any(|marker| lower.contains(marker)) {
            continue;
        }
        if let Ok(absolute) = base.join(src) {
            return Ok(absolute.to_string());
        }
    }

    let og_selector = Selector::parse(r#"meta[property="og:image"]"#).expect("og:image selector");
    if let Some(meta) = document.select(&og_selector).next() {
        let content = meta.value().attr("content").map(str::trim).unwrap_or("");
        if !content.is_empty() {
            if let Ok(absolute) = base.join(content) {
                return Ok(absolute.to_string());
            }
        }
    }

    Err(VitrineError::Extraction(format!("no strip image found on {post_url}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_post_link_on_home_page_wins() {
        let doc = Html::parse_document(
            r#"<html><body>
                 <a href="/sobre.html">About</a>
                 <h2><a href="postagem.php?id=910">Strip 910</a></h2>
                 <h2><a href="postagem.php?id=909">Strip 909</a></h2>
               </body></html>"#,
        );
        let url = find_latest_post_url(&doc, "https://www.tirinhas.com.br/").expect("url");
        assert_eq!(url, "https://www.tirinhas.com.br/postagem.php?id=910");
    }

    #[test]
    fn id_query_links_are_the_fallback() {
        let doc = Html::parse_document(
            r#"<html><body><a href="/view.php?id=17">latest</a></body></html>"#,
        );
        let url = find_latest_post_url(&doc, "https://www.tirinhas.com.br/").expect("url");
        assert_eq!(url, "https://www.tirinhas.com.br/view.php?id=17");
    }

    #[test]
    fn home_without_post_links_is_an_extraction_error() {
        let doc = Html::parse_document("<html><body><a href=\"/about\">hi</a></body></html>");
        let err = find_latest_post_url(&doc, "https://www.tirinhas.com.br/").unwrap_err();
        assert!(matches!(err, VitrineError::Extraction(_)));
    }

    #[test]
    fn decorative_images_are_passed_over() {
        let doc = Html::parse_document(
            r#"<html><body>
                 <img src="/img/logo.png"/>
                 <img src="/img/icone-menu.jpg"/>
                 <img src="/tirinhas/0910.jpg"/>
               </body></html>"#,
        );
        let url =
            find_strip_image_url(&doc, "https://www.tirinhas.com.br/postagem.php?id=910")
                .expect("url");
        assert_eq!(url, "https://www.tirinhas.com.br/tirinhas/0910.jpg");
    }

    #[test]
    fn og_image_meta_is_the_last_resort() {
        let doc = Html::parse_document(
            r#"<html><head>
                 <meta property="og:image" content="/social/preview-910.jpg"/>
               </head><body><img src="/img/logo.png"/></body></html>"#,
        );
        let url =
            find_strip_image_url(&doc, "https://www.tirinhas.com.br/postagem.php?id=910")
                .expect("url");
        assert_eq!(url, "https://www.tirinhas.com.br/social/preview-910.jpg");
    }

    #[test]
    fn post_without_any_image_is_an_extraction_error() {
        let doc = Html::parse_document("<html><body><p>text only</p></body></html>");
        let err = find_strip_image_url(&doc, "https://www.tirinhas.com.br/postagem.php?id=1")
            .unwrap_err();
        assert!(matches!(err, VitrineError::Extraction(_)));
    }
}
