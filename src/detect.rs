use encoding_rs::Encoding;
use mime::Mime;

const META_PRESCAN_BYTES: usize = 1024;

/// MIME type declared by a `Content-Type` header value, if it parses.
pub fn declared(content_type: Option<&str>) -> Option<Mime> {
    content_type.and_then(|ct| ct.trim().parse::<Mime>().ok())
}

pub fn is_html(mime: &Mime) -> bool {
    (mime.type_() == mime::TEXT && mime.subtype() == mime::HTML)
        || mime.essence_str() == "application/xhtml+xml"
}

/// Character encoding of an HTML body: byte order mark, then the declared
/// `charset` parameter, then a `charset=` in the first kilobyte, then UTF-8.
pub fn charset(mime: &Mime, body: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(body) {
        return encoding;
    }
    mime.get_param(mime::CHARSET)
        .and_then(|label| Encoding::for_label(label.as_str().as_bytes()))
        .or_else(|| meta_charset(body))
        .unwrap_or(encoding_rs::UTF_8)
}

fn meta_charset(body: &[u8]) -> Option<&'static Encoding> {
    let head = body[..body.len().min(META_PRESCAN_BYTES)].to_ascii_lowercase();
    let at = head.windows(8).position(|w| w == b"charset=")? + 8;
    let rest = &head[at..];
    let rest = rest
        .strip_prefix(b"\"")
        .or_else(|| rest.strip_prefix(b"'"))
        .unwrap_or(rest);
    let end = rest
        .iter()
        .position(|&b| matches!(b, b'"' | b'\'' | b';' | b'>' | b'/') || b.is_ascii_whitespace())
        .unwrap_or(rest.len());
    Encoding::for_label(&rest[..end])
}

/// Guesses the MIME type of a body that came without a usable header.
pub fn sniff(body: &[u8]) -> Mime {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"%PDF-", "application/pdf"),
        (b"PK\x03\x04", "application/zip"),
    ];

    if let Some((_, essence)) = SIGNATURES.iter().find(|(magic, _)| body.starts_with(magic)) {
        return essence.parse().unwrap_or(mime::APPLICATION_OCTET_STREAM);
    }
    if body.len() >= 12 && &body[..4] == b"RIFF" && &body[8..12] == b"WEBP" {
        return "image/webp".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM);
    }

    let start = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(body.len());
    let head = &body[start..];
    let looks_like_html = [&b"<!doctype html"[..], b"<html", b"<head", b"<body"]
        .iter()
        .any(|tag| {
            head.len() >= tag.len() && head[..tag.len()].eq_ignore_ascii_case(tag)
        });
    if looks_like_html {
        return mime::TEXT_HTML;
    }

    mime::APPLICATION_OCTET_STREAM
}

/// File extension (without the dot) used when saving a body of this type.
pub fn extension(mime: &Mime) -> &'static str {
    if is_html(mime) {
        return "html";
    }
    match mime.essence_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "image/x-icon" | "image/vnd.microsoft.icon" => "ico",
        "application/pdf" => "pdf",
        "application/json" => "json",
        "application/xml" | "text/xml" => "xml",
        "application/zip" => "zip",
        "application/gzip" => "gz",
        "application/javascript" | "text/javascript" => "js",
        "text/css" => "css",
        "text/plain" => "txt",
        "text/markdown" => "md",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "audio/mpeg" => "mp3",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_type_keeps_parameters_out_of_the_essence() {
        let mime = declared(Some("text/html; charset=utf-8")).unwrap();
        assert!(is_html(&mime));
        assert_eq!(extension(&mime), "html");
        assert_eq!(declared(Some("???")), None);
        assert_eq!(declared(None), None);
    }

    #[test]
    fn xhtml_counts_as_html() {
        let mime = declared(Some("application/xhtml+xml")).unwrap();
        assert!(is_html(&mime));
    }

    #[test]
    fn sniffs_signatures() {
        assert_eq!(extension(&sniff(b"\x89PNG\r\n\x1a\n....")), "png");
        assert_eq!(extension(&sniff(b"\xff\xd8\xff\xe0")), "jpg");
        assert_eq!(extension(&sniff(b"%PDF-1.7")), "pdf");
        assert_eq!(extension(&sniff(b"RIFF\0\0\0\0WEBPVP8 ")), "webp");
    }

    #[test]
    fn sniffs_html_case_insensitively() {
        assert!(is_html(&sniff(b"\n  <!DOCTYPE HTML><html></html>")));
        assert!(is_html(&sniff(b"<Html><body>x</body></Html>")));
        assert!(!is_html(&sniff(b"<?xml version=\"1.0\"?>")));
    }

    #[test]
    fn unknown_bytes_are_octet_stream() {
        let mime = sniff(b"\x00\x01\x02");
        assert_eq!(mime, mime::APPLICATION_OCTET_STREAM);
        assert_eq!(extension(&mime), "bin");
        assert_eq!(sniff(b""), mime::APPLICATION_OCTET_STREAM);
    }

    #[test]
    fn charset_prefers_bom_then_header_then_meta() {
        let latin1 = declared(Some("text/html; charset=ISO-8859-1")).unwrap();
        assert_eq!(charset(&latin1, b"<p>x</p>"), encoding_rs::WINDOWS_1252);
        assert_eq!(charset(&latin1, b"\xef\xbb\xbf<p>x</p>"), encoding_rs::UTF_8);

        let bare = mime::TEXT_HTML;
        let meta = b"<html><head><meta charset=\"Shift_JIS\"></head>";
        assert_eq!(charset(&bare, meta), encoding_rs::SHIFT_JIS);
        let equiv =
            b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=gbk\">";
        assert_eq!(charset(&bare, equiv), encoding_rs::GBK);
        assert_eq!(charset(&bare, b"<p>plain</p>"), encoding_rs::UTF_8);
    }

    #[test]
    fn parameters_do_not_change_extension() {
        let mime = declared(Some("text/plain; charset=iso-8859-1")).unwrap();
        assert_eq!(extension(&mime), "txt");
    }
}
