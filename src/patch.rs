use std::borrow::Cow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use encoding_rs::Encoding;
use lol_html::html_content::{ContentType, Element, EndTag};
use lol_html::{AsciiCompatibleEncoding, HtmlRewriter, Settings, element, end};
use percent_encoding::percent_decode_str;
use scraper::{Html, Selector};
use url::Url;

use crate::error::{Result, SaveError};

const FOOTER_TEMPLATE: &str = r#"
<br/><br/>
<div style="margin-left: 4px;">
<a style="display: inline-block; border-top: 1px solid #ccc; padding-top: 5px; color: #666; text-decoration: none;"
   href="{link}">{linkText}</a>
<p style="color:#999;">Save with <a style="color:#666; text-decoration:none; font-weight: bold;"
   href="{project}">saveurls</a>
</p>
</div>"#;

/// Home of the tool, linked from every footer.
pub const PROJECT_URL: &str = "https://github.com/gonejack/saveurls";

type HandlerResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Text of the first `<title>` element, if any.
pub fn title(html: &str) -> Result<Option<String>> {
    let selector = Selector::parse("title").map_err(|e| SaveError::Selector {
        selector: "title".to_string(),
        message: e.to_string(),
    })?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&selector)
        .next()
        .map(|t| t.text().collect::<String>()))
}

/// Rewrites resource references of `html` against `base` and, when `footer`
/// is set, links back to `source`.
///
/// The output stays in `encoding`, so the page's own charset declaration
/// remains valid. Encodings that are not ASCII-compatible are transcoded to
/// UTF-8 first.
pub fn patch(
    html: &[u8],
    encoding: &'static Encoding,
    base: &Url,
    source: &str,
    footer: bool,
) -> Result<Vec<u8>> {
    let (html, encoding) = match AsciiCompatibleEncoding::new(encoding) {
        Some(encoding) => (Cow::Borrowed(html), encoding),
        None => {
            let (text, _, _) = encoding.decode(html);
            (
                Cow::Owned(text.into_owned().into_bytes()),
                AsciiCompatibleEncoding::utf_8(),
            )
        }
    };

    let footer_html = footer.then(|| render_footer(source));
    let placed = Arc::new(AtomicBool::new(false));

    let mut settings = Settings {
        element_content_handlers: vec![
            element!("img", |el| absolutize(el, "src", base)),
            element!("video", |el| absolutize(el, "src", base)),
            element!("source", |el| absolutize(el, "src", base)),
            element!("link", |el| absolutize(el, "href", base)),
        ],
        encoding,
        ..Settings::default()
    };

    if let Some(footer_html) = footer_html.as_deref() {
        let body_placed = placed.clone();
        settings.element_content_handlers.push(element!("body", move |el| {
            let placed = body_placed.clone();
            let footer_html = footer_html.to_string();
            // `</body>` may be omitted; the document end handler covers that case.
            let handler: lol_html::EndTagHandler<'static> =
                Box::new(move |end: &mut EndTag| -> HandlerResult {
                    if !placed.swap(true, Ordering::Relaxed) {
                        end.before(&footer_html, ContentType::Html);
                    }
                    Ok(())
                });
            el.on_end_tag(handler)?;
            Ok(())
        }));

        let end_placed = placed.clone();
        settings.document_content_handlers.push(end!(move |end| {
            if !end_placed.swap(true, Ordering::Relaxed) {
                end.append(footer_html, ContentType::Html);
            }
            Ok(())
        }));
    }

    let mut output = Vec::with_capacity(html.len() + 512);
    let mut rewriter = HtmlRewriter::new(settings, |chunk: &[u8]| output.extend_from_slice(chunk));
    rewriter.write(&html)?;
    rewriter.end()?;

    Ok(output)
}

fn absolutize(el: &mut Element, attr: &str, base: &Url) -> HandlerResult {
    if attr == "src" {
        el.remove_attribute("loading");
        el.remove_attribute("srcset");
    }

    let Some(reference) = el.get_attribute(attr) else {
        return Ok(());
    };
    if let Some(resolved) = resolve(base, &reference) {
        el.set_attribute(attr, &resolved)?;
    }
    Ok(())
}

/// Absolute form of `reference`, or `None` when it must be kept as is.
pub fn resolve(base: &Url, reference: &str) -> Option<String> {
    let trimmed = reference.trim();
    if trimmed.is_empty() || trimmed.starts_with("data:") || Url::parse(trimmed).is_ok() {
        return None;
    }
    base.join(trimmed).ok().map(String::from)
}

/// Attribution block appended to every saved page.
pub fn render_footer(link: &str) -> String {
    let text = percent_decode_str(link)
        .decode_utf8()
        .map(|t| t.into_owned())
        .unwrap_or_else(|_| link.to_string());

    FOOTER_TEMPLATE
        .replace("{project}", PROJECT_URL)
        .replace("{link}", &html_escape::encode_double_quoted_attribute(link))
        .replace("{linkText}", &html_escape::encode_text(&text))
}
