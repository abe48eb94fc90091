//! Decoding of raw IMAP fetch responses into structured messages.
//!
//! A fetch response for one message is decoded into a [`MailboxMessage`]
//! holding a flat, document-ordered sequence of [`MessagePart`]s. Multipart
//! containers appear in the sequence with [`MessagePart::is_container`] set
//! and an empty payload; only leaf parts carry body bytes. Decoding is
//! all-or-nothing: if any part fails to decode, no message is produced.

use crate::error::{Error, Result};
use mailparse::{parse_mail, ParsedMail};

/// One message retrieved from the mailbox, decoded into its parts.
///
/// Immutable after creation; discarded after code extraction.
#[derive(Debug, Clone)]
pub struct MailboxMessage {
    uid: u32,
    multipart: bool,
    parts: Vec<MessagePart>,
}

impl MailboxMessage {
    /// Returns the server-assigned UID of this message.
    #[must_use]
    pub fn uid(&self) -> u32 {
        self.uid
    }

    /// Returns `true` if the message had a multipart structure.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.multipart
    }

    /// Returns the message parts in document order.
    #[must_use]
    pub fn parts(&self) -> &[MessagePart] {
        &self.parts
    }
}

/// One body part of a decoded message.
#[derive(Debug, Clone)]
pub struct MessagePart {
    content_type: String,
    container: bool,
    payload: Vec<u8>,
}

impl MessagePart {
    /// Returns the declared content type of this part (lowercased).
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Returns `true` for a part that only aggregates child parts and
    /// contributes no body text of its own.
    #[must_use]
    pub fn is_container(&self) -> bool {
        self.container
    }

    /// Returns the transfer-decoded payload bytes.
    ///
    /// Empty for container parts.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Decodes the raw bytes of a fetch response into a [`MailboxMessage`].
pub(crate) fn decode(uid: u32, raw: &[u8]) -> Result<MailboxMessage> {
    let parsed = parse_mail(raw).map_err(|source| Error::Decode { uid, source })?;

    let multipart = !parsed.subparts.is_empty();
    let mut parts = Vec::new();
    flatten(uid, &parsed, &mut parts)?;

    Ok(MailboxMessage {
        uid,
        multipart,
        parts,
    })
}

/// Walks the MIME tree depth-first, pushing one part per node.
fn flatten(uid: u32, mail: &ParsedMail<'_>, out: &mut Vec<MessagePart>) -> Result<()> {
    let content_type = mail.ctype.mimetype.to_lowercase();
    let container = content_type.starts_with("multipart/");

    let payload = if container {
        Vec::new()
    } else {
        mail.get_body_raw()
            .map_err(|source| Error::Decode { uid, source })?
    };

    out.push(MessagePart {
        content_type,
        container,
        payload,
    });

    for subpart in &mail.subparts {
        flatten(uid, subpart, out)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_single_part() {
        let raw = b"From: sender@example.com\r\nTo: user@example.com\r\n\
                    Content-Type: text/plain\r\n\r\nYour code is 123456.";

        let message = decode(1, raw).unwrap();
        assert_eq!(message.uid(), 1);
        assert!(!message.is_multipart());
        assert_eq!(message.parts().len(), 1);

        let part = &message.parts()[0];
        assert_eq!(part.content_type(), "text/plain");
        assert!(!part.is_container());
        assert!(String::from_utf8_lossy(part.payload()).contains("123456"));
    }

    #[test]
    fn test_decode_multipart_preserves_order() {
        let raw = b"From: sender@example.com\r\n\
                    Content-Type: multipart/alternative; boundary=\"sep\"\r\n\r\n\
                    --sep\r\n\
                    Content-Type: text/plain\r\n\r\n\
                    plain body\r\n\
                    --sep\r\n\
                    Content-Type: text/html\r\n\r\n\
                    <html><body>html body</body></html>\r\n\
                    --sep--\r\n";

        let message = decode(7, raw).unwrap();
        assert!(message.is_multipart());
        assert_eq!(message.parts().len(), 3);

        // Container first, leaves in document order
        assert!(message.parts()[0].is_container());
        assert_eq!(message.parts()[0].content_type(), "multipart/alternative");
        assert!(message.parts()[0].payload().is_empty());

        assert_eq!(message.parts()[1].content_type(), "text/plain");
        assert!(!message.parts()[1].is_container());

        assert_eq!(message.parts()[2].content_type(), "text/html");
        assert!(
            String::from_utf8_lossy(message.parts()[2].payload()).contains("html body")
        );
    }

    #[test]
    fn test_decode_nested_multipart() {
        let raw = b"From: sender@example.com\r\n\
                    Content-Type: multipart/mixed; boundary=\"outer\"\r\n\r\n\
                    --outer\r\n\
                    Content-Type: multipart/alternative; boundary=\"inner\"\r\n\r\n\
                    --inner\r\n\
                    Content-Type: text/plain\r\n\r\n\
                    nested plain\r\n\
                    --inner--\r\n\
                    --outer\r\n\
                    Content-Type: text/html\r\n\r\n\
                    <p>tail html</p>\r\n\
                    --outer--\r\n";

        let message = decode(9, raw).unwrap();
        let kinds: Vec<(&str, bool)> = message
            .parts()
            .iter()
            .map(|p| (p.content_type(), p.is_container()))
            .collect();

        assert_eq!(
            kinds,
            vec![
                ("multipart/mixed", true),
                ("multipart/alternative", true),
                ("text/plain", false),
                ("text/html", false),
            ]
        );
    }

    #[test]
    fn test_decode_transfer_encoding() {
        // "123456" base64-encoded in the payload
        let raw = b"From: sender@example.com\r\n\
                    Content-Type: text/html\r\n\
                    Content-Transfer-Encoding: base64\r\n\r\n\
                    PHA+MTIzNDU2PC9wPg==\r\n";

        let message = decode(3, raw).unwrap();
        let body = String::from_utf8_lossy(message.parts()[0].payload()).into_owned();
        assert_eq!(body, "<p>123456</p>");
    }
}
