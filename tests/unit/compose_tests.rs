//! Email body rendering.

use posting_watch::config::EmailConfig;
use posting_watch::models::{IdentifiedRecord, RawRecord};
use posting_watch::notify::{compose, OutboundEmail};

fn record(href: &str, title: &str) -> IdentifiedRecord {
    RawRecord::new(href, title).identify()
}

fn email_config(escape_markup: bool) -> EmailConfig {
    toml::from_str::<EmailConfig>(&format!(
        "from = \"bot@example.it\"\nto = \"me@example.it\"\nescape_markup = {escape_markup}\n"
    ))
    .expect("email config parses")
}

#[test]
fn text_body_has_one_line_per_posting_in_order() {
    let message = compose(
        &[
            record("dettaglio.php?id=7", "Educatrice asilo nido"),
            record("dettaglio.php?id=9", "Insegnante scuola infanzia"),
        ],
        true,
    );

    assert_eq!(
        message.text,
        "- Educatrice asilo nido: dettaglio.php?id=7\n- Insegnante scuola infanzia: dettaglio.php?id=9\n"
    );
}

#[test]
fn html_body_links_each_posting() {
    let message = compose(&[record("d?id=1", "Asilo")], true);
    assert_eq!(message.html, "<ul><li><a href=\"d?id=1\">Asilo</a></li></ul>");
}

#[test]
fn markup_is_escaped_when_enabled() {
    let message = compose(&[record("d?id=1&x=<2>", "Nido \"Il Girasole\" <b>")], true);

    assert!(message.html.contains("href=\"d?id=1&amp;x=&lt;2&gt;\""));
    assert!(message.html.contains("Nido &quot;Il Girasole&quot; &lt;b&gt;"));
    // The text body is never escaped.
    assert!(message.text.contains("Nido \"Il Girasole\" <b>"));
}

#[test]
fn markup_is_verbatim_when_disabled() {
    let message = compose(&[record("d?id=1", "<b>Nido</b>")], false);
    assert!(message.html.contains("<a href=\"d?id=1\"><b>Nido</b></a>"));
}

#[test]
fn outbound_email_carries_envelope_and_heading() {
    let config = email_config(true);
    let message = compose(&[record("d?id=1", "Asilo")], true);

    let email = OutboundEmail::build(&config, &message);

    assert_eq!(email.from, "bot@example.it");
    assert_eq!(email.to, "me@example.it");
    assert_eq!(email.subject, "Nuovi bandi di concorso");
    assert_eq!(email.message_stream, "outbound");
    assert!(email.html_body.starts_with("<h1>Ecco i nuovi bandi di concorso</h1>\n<ul>"));
    assert_eq!(email.text_body, "Ecco i nuovi bandi di concorso \n- Asilo: d?id=1\n");
}

#[test]
fn outbound_email_serializes_provider_field_names() {
    let config = email_config(false);
    let email = OutboundEmail::build(&config, &compose(&[record("d?id=1", "Asilo")], false));

    let value = serde_json::to_value(&email).expect("serializes");
    for field in ["From", "To", "Subject", "HtmlBody", "TextBody", "MessageStream"] {
        assert!(value.get(field).is_some(), "missing {field}");
    }
}
