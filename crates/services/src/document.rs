//! Printable presskit document, rendered from section data.

use backstage_db::models::presskit::Presskit;

/// Content type of [`render_presskit_html`] output.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Render a self-contained HTML document for a presskit.
///
/// When `watermark` is set it is stamped in the header and repeated as a
/// fixed background overlay on every printed page.
pub fn render_presskit_html(
    presskit: &Presskit,
    artist_name: Option<&str>,
    watermark: Option<&str>,
) -> String {
    let title = escape_html(&presskit.title);
    let mut html = String::with_capacity(2048);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{title}</title>\n"));
    html.push_str(
        "<style>\
         body{font-family:sans-serif;max-width:48rem;margin:2rem auto;line-height:1.5}\
         .watermark{position:fixed;top:45%;left:0;right:0;text-align:center;\
         font-size:3rem;opacity:.12;transform:rotate(-30deg);pointer-events:none}\
         </style>\n</head>\n<body>\n",
    );

    if let Some(mark) = watermark.filter(|m| !m.trim().is_empty()) {
        let mark = escape_html(mark);
        html.push_str(&format!("<div class=\"watermark\">{mark}</div>\n"));
        html.push_str(&format!("<p class=\"shared-with\">{mark}</p>\n"));
    }

    html.push_str(&format!("<h1>{title}</h1>\n"));
    if let Some(name) = artist_name {
        html.push_str(&format!("<h2>{}</h2>\n", escape_html(name)));
    }

    for section in presskit.sections.iter() {
        html.push_str(&format!(
            "<section id=\"{}\">\n<h3>{}</h3>\n",
            escape_html(&section.id),
            escape_html(&section.title)
        ));
        for paragraph in section.body.split("\n\n").filter(|p| !p.trim().is_empty()) {
            html.push_str(&format!("<p>{}</p>\n", escape_html(paragraph.trim())));
        }
        html.push_str("</section>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
