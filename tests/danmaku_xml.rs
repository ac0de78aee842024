use danmaku_analysis::{CommentRecord, parse_comments};

fn feed(body: &str) -> String {
    format!(
        r##"<?xml version="1.0" encoding="UTF-8"?>
<i>
  <chatserver>chat.bilibili.com</chatserver>
  <chatid>279786</chatid>
  <mission>0</mission>
  <maxlimit>3000</maxlimit>
  <state>0</state>
  <real_name>0</real_name>
  <source>k-v</source>
{}
</i>"##,
        body
    )
}

fn rec(timestamp: f64, text: &str) -> CommentRecord {
    CommentRecord {
        timestamp,
        text: text.to_string(),
    }
}

#[test]
fn extracts_timestamp_and_trimmed_text_in_document_order() {
    let xml = feed(
        r#"  <d p="12.34500,1,25,16777215,1700000000,0,a1b2c3d4,1234567890123,10">  前方高能  </d>
  <d p="3.2,1,25,16777215,1700000001,0,e5f6a7b8,1234567890124,10">泪目</d>
  <d p="3.2,1,25,16777215,1700000001,0,e5f6a7b8,1234567890124,10">泪目</d>"#,
    );
    let got = parse_comments(&xml);
    assert_eq!(
        got,
        vec![rec(12.345, "前方高能"), rec(3.2, "泪目"), rec(3.2, "泪目")]
    );
}

#[test]
fn skips_elements_without_p_or_text() {
    let xml = feed(
        r#"  <d>no attribute</d>
  <d p="1.0,1"></d>
  <d p="2.0,1">   </d>
  <d p="3.0,1"/>
  <d p="oops,1">bad timestamp</d>
  <d p="4.5,1">kept</d>"#,
    );
    assert_eq!(parse_comments(&xml), vec![rec(4.5, "kept")]);
}

#[test]
fn unescapes_entities_and_reads_cdata() {
    let xml = feed(
        r#"  <d p="1,1">a &amp; b &lt;3</d>
  <d p="2,1"><![CDATA[<raw> text]]></d>"#,
    );
    assert_eq!(
        parse_comments(&xml),
        vec![rec(1.0, "a & b <3"), rec(2.0, "<raw> text")]
    );
}

#[test]
fn malformed_markup_yields_empty_list() {
    let xml = r#"<i><d p="1,1">ok</d><d p="2,1">broken</x></i>"#;
    assert!(parse_comments(xml).is_empty());
    assert!(parse_comments("").is_empty());

    // feed cut off mid-document
    let truncated = r#"<?xml version="1.0"?><i><d p="1,1">one</d><d p="2,1">two</d><d p="3,1">thr"#;
    assert!(parse_comments(truncated).is_empty());
    assert!(parse_comments(r#"<i><d p="1,1">one</d>"#).is_empty());

    // two documents glued together
    let two_roots = r#"<i><d p="1,1">one</d></i><i><d p="2,1">two</d></i>"#;
    assert!(parse_comments(two_roots).is_empty());
    assert!(parse_comments(r#"<i><d p="1,1">one</d></i><extra/>"#).is_empty());
    assert!(parse_comments(r#"<i><d p="1,1">one</d></i>trailing"#).is_empty());
}

#[test]
fn empty_root_is_a_valid_empty_feed() {
    assert!(parse_comments(&feed("")).is_empty());
    assert!(parse_comments("<i/>").is_empty());
}

#[test]
fn text_after_a_child_element_is_not_part_of_the_body() {
    let xml = feed(r#"  <d p="1,1">a<b>x</b>c</d>"#);
    assert_eq!(parse_comments(&xml), vec![rec(1.0, "a")]);
}

#[test]
fn parsing_is_idempotent() {
    let xml = feed(
        r#"  <d p="5,1">one</d>
  <d p="1,1">two</d>"#,
    );
    let first = parse_comments(&xml);
    let second = parse_comments(&xml);
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[test]
fn only_root_level_d_elements_count() {
    let xml = feed(r#"  <list><d p="9,1">nested</d></list>"#);
    assert!(parse_comments(&xml).is_empty());
}
