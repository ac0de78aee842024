use log::{debug, error, info};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};
use crate::store::CommentRecord;

/// Extract `(timestamp, text)` pairs from a comment feed such as
/// `<i><d p="12.5,1,25,16777215,...">text</d></i>`.
///
/// Only `d` elements directly under the root count. Elements without a `p`
/// attribute, with empty text or an unparsable first `p` field are skipped.
/// Malformed markup (unclosed elements, several roots, stray text around the
/// root) yields an empty list. Only the text before a comment's first child
/// element is its body.
pub fn parse_comments(xml: &str) -> Vec<CommentRecord> {
    if xml.is_empty() {
        return Vec::new();
    }
    match parse_feed(xml) {
        Ok(records) => {
            info!("Parsed {} comments with timestamps", records.len());
            records
        }
        Err(e) => {
            error!("Parse comment XML failed: {e}");
            Vec::new()
        }
    }
}

// ---- Internal helpers ----

struct OpenComment {
    p: Option<String>,
    text: String,
    // a child element ends the leading text; later text is its tail
    sealed: bool,
}

fn parse_feed(xml: &str) -> Result<Vec<CommentRecord>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut root_seen = false;
    let mut current: Option<OpenComment> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                if depth == 0 && root_seen {
                    return Err(Error::MalformedFeed("more than one root element"));
                }
                root_seen = true;
                depth += 1;
                if depth == 2 && e.name().as_ref() == b"d" {
                    current = Some(OpenComment {
                        p: p_attribute(&e)?,
                        text: String::new(),
                        sealed: false,
                    });
                } else if let (Some(open), 3) = (current.as_mut(), depth) {
                    open.sealed = true;
                }
            }
            Event::Empty(_) => {
                if depth == 0 {
                    if root_seen {
                        return Err(Error::MalformedFeed("more than one root element"));
                    }
                    root_seen = true;
                } else if let (Some(open), 2) = (current.as_mut(), depth) {
                    open.sealed = true;
                }
            }
            Event::End(_) => {
                if depth == 2 {
                    if let Some(open) = current.take() {
                        if let Some(record) = finish_comment(open) {
                            out.push(record);
                        }
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Text(t) => {
                let text = t.unescape()?;
                match (current.as_mut(), depth) {
                    (Some(open), 2) if !open.sealed => open.text.push_str(&text),
                    (_, 0) if !text.trim().is_empty() => {
                        return Err(Error::MalformedFeed("text outside the root element"));
                    }
                    _ => {}
                }
            }
            Event::CData(c) => {
                if let (Some(open), 2) = (current.as_mut(), depth) {
                    if !open.sealed {
                        open.text.push_str(&String::from_utf8_lossy(&c));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !root_seen {
        return Err(Error::MalformedFeed("no root element"));
    }
    if depth != 0 || current.is_some() {
        return Err(Error::MalformedFeed("document ends inside an open element"));
    }
    Ok(out)
}

fn p_attribute(e: &BytesStart<'_>) -> std::result::Result<Option<String>, quick_xml::Error> {
    match e.try_get_attribute("p")? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn finish_comment(open: OpenComment) -> Option<CommentRecord> {
    let text = open.text.trim();
    if text.is_empty() {
        return None;
    }
    let Some(p) = open.p else {
        debug!("Skipping comment without p attribute: {text}");
        return None;
    };
    let first = p.split(',').next().unwrap_or_default().trim();
    match first.parse::<f64>() {
        Ok(timestamp) if timestamp.is_finite() && timestamp >= 0.0 => Some(CommentRecord {
            timestamp,
            text: text.to_string(),
        }),
        _ => {
            debug!("Skipping comment with bad timestamp field '{first}'");
            None
        }
    }
}
