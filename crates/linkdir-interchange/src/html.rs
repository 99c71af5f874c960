use crate::{InterchangeError, Parsed};
use linkdir_core::{Link, LinkCandidate, DEFAULT_COLOR};
use regex::{Captures, Regex};
use std::fmt::Write;
use std::sync::LazyLock;
use tracing::debug;

static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").expect("valid regex"));
static HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).expect("valid regex")
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|amp|lt|gt|quot|apos|nbsp);").expect("valid regex")
});

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => {
                    let code = match entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => entity[1..].parse().ok(),
                    };
                    code.and_then(char::from_u32)
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Extracts every anchor of a browser bookmarks export.
///
/// Anchor text becomes the name and `href` the production URL. Anchors
/// without either are dropped and counted.
pub fn parse_bookmarks_html(contents: &str) -> Result<Parsed, InterchangeError> {
    if contents.trim().is_empty() {
        return Err(InterchangeError::Empty);
    }

    let mut parsed = Parsed::default();
    for anchor in ANCHOR.captures_iter(contents) {
        let href = HREF.captures(&anchor[1]).and_then(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| decode_entities(m.as_str().trim()))
        });
        let text = decode_entities(&TAG.replace_all(&anchor[2], ""));
        let name = text.split_whitespace().collect::<Vec<_>>().join(" ");

        match href.filter(|href| !href.is_empty()) {
            Some(href) if !name.is_empty() => parsed.links.push(LinkCandidate {
                name,
                production: href,
                color: Some(DEFAULT_COLOR.to_string()),
                ..Default::default()
            }),
            _ => parsed.dropped += 1,
        }
    }

    debug!(
        links = parsed.links.len(),
        dropped = parsed.dropped,
        "parsed bookmarks file"
    );
    Ok(parsed)
}

fn write_anchor(out: &mut String, indent: &str, url: &str, title: &str, link: &Link) -> std::fmt::Result {
    write!(out, "{indent}<DT><A HREF=\"{}\"", escape(url))?;
    if let Some(created) = link.created_at {
        write!(out, " ADD_DATE=\"{}\"", created.as_second())?;
    }
    writeln!(out, ">{}</A>", escape(title))
}

fn write_bookmarks(out: &mut String, groups: &[(String, Vec<Link>)]) -> std::fmt::Result {
    writeln!(out, "<!DOCTYPE NETSCAPE-Bookmark-file-1>")?;
    writeln!(out, "<META HTTP-EQUIV=\"Content-Type\" CONTENT=\"text/html; charset=UTF-8\">")?;
    writeln!(out, "<TITLE>Bookmarks</TITLE>")?;
    writeln!(out, "<H1>Bookmarks</H1>")?;
    writeln!(out, "<DL><p>")?;

    for (category, links) in groups {
        writeln!(out, "    <DT><H3>{}</H3>", escape(category))?;
        writeln!(out, "    <DL><p>")?;
        for link in links {
            let populated = link.environments.populated();
            if populated.len() > 1 {
                writeln!(out, "        <DT><H3>{}</H3>", escape(&link.name))?;
                writeln!(out, "        <DL><p>")?;
                for (environment, url) in populated {
                    let title = format!("{} ({environment})", link.name);
                    write_anchor(out, "            ", url, &title, link)?;
                }
                writeln!(out, "        </DL><p>")?;
            } else {
                write_anchor(out, "        ", &link.environments.production, &link.name, link)?;
            }
        }
        writeln!(out, "    </DL><p>")?;
    }

    writeln!(out, "</DL><p>")
}

/// Renders links as a NETSCAPE-Bookmark-file-1 document, one folder per
/// category group. A link with several environments becomes a folder with
/// one anchor per environment.
pub fn export_bookmarks_html(groups: &[(String, Vec<Link>)]) -> String {
    let mut out = String::new();
    // formatting into a String cannot fail
    let _ = write_bookmarks(&mut out, groups);
    out
}
