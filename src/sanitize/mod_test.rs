use super::*;

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

// =============================================================
// sanitize_text
// =============================================================

#[test]
fn sanitize_text_drops_script_with_contents() {
    assert_eq!(sanitize_text("<script>alert(1)</script>hello"), "hello");
}

#[test]
fn sanitize_text_keeps_inner_text_of_other_tags() {
    assert_eq!(sanitize_text("<b>bold</b> and <a href=\"x\">link</a>"), "bold and link");
}

#[test]
fn sanitize_text_escapes_stray_angle_brackets() {
    let out = sanitize_text("1 < 2 & 3 > 2");
    assert!(!out.contains('<'));
    assert!(out.contains("&lt;"));
    assert!(out.contains("&amp;"));
}

#[test]
fn sanitize_text_is_idempotent() {
    for input in [
        "<script>x</script>hello",
        "a < b && c > d",
        "<img src=x onerror=alert(1)>caption",
        "plain text https://x.com/a.png?x=1&y=2",
        "<<b>>nested<</b>>",
    ] {
        let once = sanitize_text(input);
        assert_eq!(sanitize_text(&once), once, "input: {input}");
    }
}

#[test]
fn sanitize_text_removes_disallowed_markup() {
    for input in [
        "<iframe src=\"https://evil.test\"></iframe>hi",
        "<style>body{}</style>hi",
        "<div onclick=\"x()\">hi</div>",
        "<!-- comment -->hi",
    ] {
        let out = sanitize_text(input);
        assert!(!out.contains('<'), "output kept markup: {out}");
        assert!(out.ends_with("hi"));
    }
}

// =============================================================
// media detection + expansion
// =============================================================

#[test]
fn embeds_image_url_as_placeholder() {
    let out = embed_media_placeholders("look https://x.com/a.png now");
    assert_eq!(out, "look [MEDIA:image:https://x.com/a.png] now");
}

#[test]
fn embeds_image_url_with_query_and_trailing_punctuation() {
    let out = embed_media_placeholders("see https://x.com/a.JPG?size=2.");
    assert_eq!(out, "see [MEDIA:image:https://x.com/a.JPG?size=2.]");

    let out = embed_media_placeholders("see https://x.com/a.gif.");
    assert_eq!(out, "see [MEDIA:image:https://x.com/a.gif].");
}

#[test]
fn embeds_youtube_links_as_embed_urls() {
    let out = embed_media_placeholders("https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    assert_eq!(out, "[MEDIA:youtube:https://www.youtube.com/embed/dQw4w9WgXcQ]");

    let out = embed_media_placeholders("https://youtu.be/dQw4w9WgXcQ");
    assert_eq!(out, "[MEDIA:youtube:https://www.youtube.com/embed/dQw4w9WgXcQ]");
}

#[test]
fn embeds_video_urls() {
    let out = embed_media_placeholders("clip: http://cdn.test/v.webm");
    assert_eq!(out, "clip: [MEDIA:video:http://cdn.test/v.webm]");
}

#[test]
fn leaves_other_urls_as_text() {
    let text = "docs at https://example.test/page";
    assert_eq!(embed_media_placeholders(text), text);
}

#[test]
fn expand_rejects_non_http_schemes() {
    let out = expand_placeholders("[MEDIA:image:javascript:alert(1)]");
    assert_eq!(out, INVALID_MEDIA_HTML);

    let out = expand_placeholders("[MEDIA:video:ftp://files.test/v.mp4]");
    assert_eq!(out, INVALID_MEDIA_HTML);
}

#[test]
fn expand_builds_fixed_fragments() {
    let img = expand_placeholders("[MEDIA:image:https://x.com/a.png]");
    assert!(img.starts_with("<img src=\"https://x.com/a.png\""));

    let yt = expand_placeholders("[MEDIA:youtube:https://www.youtube.com/embed/dQw4w9WgXcQ]");
    assert!(yt.starts_with("<iframe src=\"https://www.youtube.com/embed/dQw4w9WgXcQ\""));

    let video = expand_placeholders("[MEDIA:video:https://x.com/v.mp4]");
    assert!(video.starts_with("<video src=\"https://x.com/v.mp4\" controls"));
}

#[test]
fn validate_media_url_accepts_only_http_and_https() {
    assert_eq!(validate_media_url("https://x.com/a.png").as_deref(), Some("https://x.com/a.png"));
    assert!(validate_media_url("http://x.com/a.png").is_some());
    assert!(validate_media_url("data:image/png;base64,AAAA").is_none());
    assert!(validate_media_url("javascript:alert(1)").is_none());
    assert!(validate_media_url("/relative.png").is_none());
}

// =============================================================
// process_message
// =============================================================

#[test]
fn process_message_strips_script_and_embeds_image() {
    let html = process_message("<script>x</script>hello https://x.com/a.png");
    assert!(html.starts_with("hello "));
    assert_eq!(count(&html, "<img"), 1);
    assert!(html.contains("src=\"https://x.com/a.png\""));
    assert!(!html.contains("<script"));
    assert!(!html.contains("x</"));
}

#[test]
fn process_message_embeds_exactly_one_element_per_recognized_url() {
    for (input, tag, url) in [
        ("https://x.com/a.webp", "<img", "https://x.com/a.webp"),
        ("http://x.com/v.mp4", "<video", "http://x.com/v.mp4"),
        ("https://youtu.be/abcdefghijk", "<iframe", "https://www.youtube.com/embed/abcdefghijk"),
    ] {
        let html = process_message(input);
        assert_eq!(count(&html, tag), 1, "input {input} -> {html}");
        assert!(html.contains(&format!("src=\"{url}\"")), "input {input} -> {html}");
    }
}

#[test]
fn process_message_typed_placeholder_with_bad_scheme_is_inert() {
    let html = process_message("[MEDIA:image:javascript:alert(1)]");
    assert!(html.contains("[Invalid media URL]"));
    assert!(!html.contains("<img"));
    assert!(!html.contains("javascript:"));
}

#[test]
fn process_message_never_emits_event_handlers() {
    let html = process_message("<img src=https://x.com/a.png onerror=alert(1)> https://x.com/b.png");
    assert!(!html.contains("onerror"));
    assert_eq!(count(&html, "<img"), 1);
    assert!(html.contains("https://x.com/b.png"));
}

#[test]
fn sanitize_html_strips_attributes_outside_whitelist() {
    let html = sanitize_html(r#"<a href="https://x.test" onclick="x()" style="color:red">x</a>"#);
    assert_eq!(html, r#"<a href="https://x.test">x</a>"#);
}

#[test]
fn sanitize_html_denies_relative_and_foreign_scheme_urls() {
    let html = sanitize_html(r#"<img src="/local.png"><img src="javascript:alert(1)">"#);
    assert!(!html.contains("src="));
}

#[test]
fn escape_html_escapes_quotes_and_brackets() {
    let out = escape_html(r#"<b a="1">"#);
    assert!(!out.contains('<'));
    assert!(!out.contains('"'));
}

// =============================================================
// message_segments
// =============================================================

#[test]
fn segments_split_text_and_media() {
    let segments = message_segments("hi & bye https://x.com/a.png!");
    assert_eq!(
        segments,
        vec![
            Segment::Text("hi & bye ".to_owned()),
            Segment::Media { kind: MediaKind::Image, url: "https://x.com/a.png".to_owned() },
            Segment::Text("!".to_owned()),
        ]
    );
}

#[test]
fn segments_mark_invalid_media() {
    let segments = message_segments("[MEDIA:video:mailto:x@y.z]");
    assert_eq!(segments, vec![Segment::InvalidMedia]);
}
