//! Bibliographic metadata carried by document directives.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::DocMeta;

static XML_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([A-Za-z_][\w.-]*)\s*=\s*"([^"]*)""#).unwrap());
static ENGLISH_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<english_text>([^<]*)</english_text>").unwrap());

/// Folds one document directive into `meta`.
pub(crate) fn read_meta_line(line: &str, meta: &mut DocMeta) {
    let body = line.trim_start_matches("#!").trim();
    if let Some(rest) = body.strip_prefix("DOCID") {
        if let Some(id) = rest.split_whitespace().last() {
            meta.bib_id = Some(id.to_string());
        }
        return;
    }
    if let Some(at) = body.find('<') {
        read_xml_fragment(&body[at..], meta);
    }
}

fn read_xml_fragment(fragment: &str, meta: &mut DocMeta) {
    let xml = format!("<root>{}</root>", fragment.replace('&', "&amp;"));
    for cap in XML_ATTR.captures_iter(&xml) {
        let value = unescape(&cap[2]);
        match &cap[1] {
            "sent_id" => meta.sent_id = Some(value),
            "newdoc_id" | "newdoc" => meta.newdoc_id = Some(value),
            "english_text" | "text_en" => meta.text_en = Some(value),
            _ => {}
        }
    }
    if let Some(cap) = ENGLISH_TEXT.captures(&xml) {
        meta.text_en = Some(unescape(cap[1].trim()));
    }
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
