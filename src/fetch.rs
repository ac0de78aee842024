//! Platform lookups: identifier to cid, cid to raw comment feed, and the
//! fetch stage that chains them into the row file.

use std::path::Path;
use std::time::Duration;

use log::{info, warn};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::Value;

use crate::danmaku_xml::parse_comments;
use crate::error::{Error, Result};
use crate::resolve::{IdKind, Identifier, resolve_identifier};
use crate::store::save_comments;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);
const FEED_TIMEOUT: Duration = Duration::from_secs(15);

/// Opaque content id that keys the comment feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cid(pub u64);

impl std::fmt::Display for Cid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Base URLs of the three platform endpoints.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Page list by `bvid` / `aid`.
    pub pagelist: String,
    /// Season view by `ep_id` / `season_id`.
    pub season: String,
    /// Comment feed template, `{cid}` is replaced.
    pub comment_feed: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            pagelist: "https://api.bilibili.com/x/player/pagelist".to_string(),
            season: "https://api.bilibili.com/pgc/view/web/season".to_string(),
            comment_feed: "https://comment.bilibili.com/{cid}.xml".to_string(),
        }
    }
}

pub struct BiliClient {
    http: Client,
    endpoints: Endpoints,
}

impl BiliClient {
    pub fn new(endpoints: Endpoints) -> Result<Self> {
        let http = Client::builder().user_agent(USER_AGENT).gzip(true).deflate(true).build()?;
        Ok(Self { http, endpoints })
    }

    /// One GET against the lookup API matching `id.kind`; no retries.
    pub fn fetch_cid(&self, id: &Identifier) -> Result<Cid> {
        let (url, param) = match id.kind {
            IdKind::Bvid => (&self.endpoints.pagelist, "bvid"),
            IdKind::Avid => (&self.endpoints.pagelist, "aid"),
            IdKind::Episode => (&self.endpoints.season, "ep_id"),
            IdKind::Season => (&self.endpoints.season, "season_id"),
        };

        let response = self
            .http
            .get(url)
            .query(&[(param, id.value.as_str())])
            .header(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"))
            .timeout(LOOKUP_TIMEOUT)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status,
                url: url.clone(),
            });
        }
        let body: Value = response
            .json()
            .map_err(|e| Error::NotFound(format!("JSON body ({e})")))?;

        let cid = extract_cid(id.kind, &body)
            .ok_or_else(|| Error::NotFound(format!("cid for {} {}", id.kind, id.value)))?;
        info!("Resolved {} {} to cid {cid}", id.kind, id.value);
        Ok(cid)
    }

    /// Download the raw comment feed. Invalid UTF-8 is replaced, never fatal.
    pub fn fetch_comment_xml(&self, cid: Cid) -> Result<String> {
        let url = self.endpoints.comment_feed.replace("{cid}", &cid.to_string());
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/xml, text/xml, */*"),
        );

        let response = self
            .http
            .get(&url)
            .headers(headers)
            .timeout(FEED_TIMEOUT)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status { status, url });
        }
        let bytes = response.bytes()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Pull the first page's cid out of a lookup response.
///
/// Video ids answer `{"code":0,"data":[{"cid":..}]}`, season and episode ids
/// answer `{"code":0,"result":{"episodes":[{"cid":..}]}}`. Anything else,
/// including a cid of 0, is not found.
pub fn extract_cid(kind: IdKind, body: &Value) -> Option<Cid> {
    if body.get("code").and_then(Value::as_i64) != Some(0) {
        return None;
    }
    let first = match kind {
        IdKind::Bvid | IdKind::Avid => body.get("data")?.as_array()?.first()?,
        IdKind::Episode | IdKind::Season => {
            body.get("result")?.get("episodes")?.as_array()?.first()?
        }
    };
    let cid = match first.get("cid")? {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (cid != 0).then_some(Cid(cid))
}

/// Resolve `url`, look up its cid, download and parse the feed, and write the
/// row file. Each step that produces nothing is logged and ends the run
/// early; no row file is written then. Returns the number of rows written.
pub fn run_fetch(client: &BiliClient, url: &str, output: &Path) -> usize {
    let Some(id) = resolve_identifier(url) else {
        return 0;
    };
    info!("Identified {} {}", id.kind, id.value);

    let cid = match client.fetch_cid(&id) {
        Ok(cid) => cid,
        Err(e) => {
            warn!("Could not get cid: {e}");
            return 0;
        }
    };

    let xml = match client.fetch_comment_xml(cid) {
        Ok(xml) if !xml.is_empty() => xml,
        Ok(_) => {
            warn!("Comment feed for cid {cid} is empty");
            return 0;
        }
        Err(e) => {
            warn!("Could not download comment feed: {e}");
            return 0;
        }
    };

    let records = parse_comments(&xml);
    match save_comments(&records, output) {
        Ok(true) => records.len(),
        Ok(false) => 0,
        Err(e) => {
            warn!("Could not write {}: {e}", output.display());
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    use crate::store::{CommentRecord, load_comments};

    const FEED: &[u8] = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<i><chatid>7</chatid><d p=\"1.5,1,25\">ok</d><d p=\"2,1,25\">bad\xff\xfebyte</d></i>";

    /// Answer one connection per canned `(status, body)`, in order.
    fn serve(responses: Vec<(u16, &'static [u8])>) -> Endpoints {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            for (status, body) in responses {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                read_head(&mut stream);
                let head = format!(
                    "HTTP/1.1 {status} Canned\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(body);
            }
        });
        Endpoints {
            pagelist: format!("http://{addr}/x/player/pagelist"),
            season: format!("http://{addr}/pgc/view/web/season"),
            comment_feed: format!("http://{addr}/{{cid}}.xml"),
        }
    }

    fn read_head(stream: &mut TcpStream) {
        let mut seen = Vec::new();
        let mut chunk = [0u8; 1024];
        while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => seen.extend_from_slice(&chunk[..n]),
            }
        }
    }

    fn bvid() -> Identifier {
        Identifier {
            kind: IdKind::Bvid,
            value: "BV1xx411c7mD".to_string(),
        }
    }

    #[test]
    fn cid_from_pagelist() {
        let body = json!({"code": 0, "data": [{"cid": 279786, "page": 1}, {"cid": 2}]});
        assert_eq!(extract_cid(IdKind::Bvid, &body), Some(Cid(279786)));
        assert_eq!(extract_cid(IdKind::Avid, &body), Some(Cid(279786)));
    }

    #[test]
    fn cid_from_season_view() {
        let body = json!({"code": 0, "result": {"episodes": [{"cid": "5551"}]}});
        assert_eq!(extract_cid(IdKind::Episode, &body), Some(Cid(5551)));
        assert_eq!(extract_cid(IdKind::Season, &body), Some(Cid(5551)));
    }

    #[test]
    fn missing_or_unexpected_fields_are_not_found() {
        let cases = [
            json!({"code": -404, "message": "not found"}),
            json!({"code": 0}),
            json!({"code": 0, "data": []}),
            json!({"code": 0, "data": [{"cid": 0}]}),
            json!({"code": 0, "data": {"cid": 12}}),
            json!({"code": 0, "data": [{"cid": [1]}]}),
            json!({"data": [{"cid": 12}]}),
            json!("plain string"),
        ];
        for body in &cases {
            assert_eq!(extract_cid(IdKind::Bvid, body), None, "{body}");
        }
    }

    #[test]
    fn wrong_family_is_not_found() {
        let pagelist = json!({"code": 0, "data": [{"cid": 1}]});
        assert_eq!(extract_cid(IdKind::Season, &pagelist), None);
    }

    #[test]
    fn connection_failure_is_an_error_not_a_panic() {
        let endpoints = Endpoints {
            pagelist: "http://127.0.0.1:9/x/player/pagelist".to_string(),
            season: "http://127.0.0.1:9/pgc/view/web/season".to_string(),
            comment_feed: "http://127.0.0.1:9/{cid}.xml".to_string(),
        };
        let client = BiliClient::new(endpoints).unwrap();
        let id = Identifier {
            kind: IdKind::Bvid,
            value: "BV1xx411c7mD".to_string(),
        };
        assert!(matches!(client.fetch_cid(&id), Err(Error::Http(_))));
        assert!(matches!(client.fetch_comment_xml(Cid(1)), Err(Error::Http(_))));
    }

    #[test]
    fn error_status_is_reported() {
        let client = BiliClient::new(serve(vec![(500, &b"oops"[..])])).unwrap();
        match client.fetch_cid(&bvid()) {
            Err(Error::Status { status, url }) => {
                assert_eq!(status.as_u16(), 500);
                assert!(url.ends_with("/x/player/pagelist"));
            }
            other => panic!("expected a status error, got {other:?}"),
        }
    }

    #[test]
    fn cid_lookup_over_http() {
        let body: &'static [u8] = br#"{"code":0,"data":[{"cid":279786}]}"#;
        let client = BiliClient::new(serve(vec![(200, body)])).unwrap();
        assert_eq!(client.fetch_cid(&bvid()).unwrap(), Cid(279786));
    }

    #[test]
    fn invalid_utf8_in_feed_is_replaced() {
        let client = BiliClient::new(serve(vec![(200, FEED)])).unwrap();
        let xml = client.fetch_comment_xml(Cid(7)).unwrap();
        assert!(xml.contains("bad\u{FFFD}\u{FFFD}byte"), "{xml}");
    }

    #[test]
    fn fetch_stage_writes_row_file() {
        let lookup: &'static [u8] = br#"{"code":0,"data":[{"cid":7}]}"#;
        let client = BiliClient::new(serve(vec![(200, lookup), (200, FEED)])).unwrap();
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join(crate::ROW_FILE);

        let saved = run_fetch(&client, "https://www.bilibili.com/video/BV1xx411c7mD", &path);
        assert_eq!(saved, 2);
        let rows = load_comments(&path).unwrap();
        assert_eq!(
            rows,
            vec![
                CommentRecord {
                    timestamp: 1.5,
                    text: "ok".to_string()
                },
                CommentRecord {
                    timestamp: 2.0,
                    text: "bad\u{FFFD}\u{FFFD}byte".to_string()
                },
            ]
        );
    }

    #[test]
    fn failed_lookup_writes_no_row_file() {
        let client = BiliClient::new(serve(vec![(404, &b""[..])])).unwrap();
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join(crate::ROW_FILE);
        assert_eq!(
            run_fetch(&client, "https://www.bilibili.com/video/BV1xx411c7mD", &path),
            0
        );
        assert!(!path.exists());
    }
}
