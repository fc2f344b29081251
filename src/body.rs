//! Body extraction from a message's MIME part tree.
//!
//! The Gmail payload is first converted into a [`MimeNode`] tree, where a node
//! is either a leaf carrying (optional) inline data or a multipart container.
//! Extraction is a depth-first search that takes the first match in declared
//! order. At each child, `text/html` is checked before `text/plain`.
//!
//! An HTML child's own inline data wins over anything nested below it. An HTML
//! child without data that is itself a container is descended into and its
//! result is final, even when that subtree holds nothing: later siblings are
//! not examined. This is deliberate and pinned by tests.
//!
//! MIME types are matched exactly (`text/html`, not `Text/HTML`).

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use tracing::warn;

use crate::gmail::MessagePart;

/// Returned in place of a body when nothing decodable was found.
pub const NO_CONTENT: &str = "No content found.";

const TEXT_HTML: &str = "text/html";
const TEXT_PLAIN: &str = "text/plain";

/// URL-safe alphabet; Gmail sometimes omits padding.
const GMAIL_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A node in the content tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimeNode {
    Leaf {
        mime_type: String,
        data: Option<String>,
    },
    /// A container. `data` is the container's own inline body, which Gmail
    /// occasionally sends alongside `parts`.
    Multipart {
        mime_type: String,
        data: Option<String>,
        children: Vec<MimeNode>,
    },
}

impl MimeNode {
    pub fn mime_type(&self) -> &str {
        match self {
            Self::Leaf { mime_type, .. } | Self::Multipart { mime_type, .. } => mime_type,
        }
    }

    /// Inline body data carried by this node itself.
    pub fn data(&self) -> Option<&str> {
        match self {
            Self::Leaf { data, .. } | Self::Multipart { data, .. } => data.as_deref(),
        }
    }

    fn is(&self, mime: &str) -> bool {
        self.mime_type() == mime
    }
}

impl From<&MessagePart> for MimeNode {
    fn from(part: &MessagePart) -> Self {
        match part.parts.as_deref() {
            Some(children) if !children.is_empty() => Self::Multipart {
                mime_type: part.mime_type.clone(),
                data: part.data().map(str::to_string),
                children: children.iter().map(MimeNode::from).collect(),
            },
            _ => Self::Leaf {
                mime_type: part.mime_type.clone(),
                data: part.data().map(str::to_string),
            },
        }
    }
}

/// Which branch produced the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Html,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedBody {
    pub kind: BodyKind,
    pub text: String,
}

impl ExtractedBody {
    pub fn is_html(&self) -> bool {
        self.kind == BodyKind::Html
    }
}

/// Find the message body in `node`, or `None` if there is none.
///
/// A container is searched through its children only; its own inline data is
/// consulted when it is a text child of the level being scanned.
pub fn extract(node: &MimeNode) -> Option<ExtractedBody> {
    match node {
        MimeNode::Multipart { children, .. } => {
            for child in children {
                if child.is(TEXT_HTML) {
                    if let Some(data) = child.data() {
                        return decode_leaf(data, BodyKind::Html);
                    }
                    if let MimeNode::Multipart { .. } = child {
                        return extract(child);
                    }
                } else if child.is(TEXT_PLAIN) {
                    if let Some(data) = child.data() {
                        return decode_leaf(data, BodyKind::Plain);
                    }
                }
            }
            None
        }
        MimeNode::Leaf {
            mime_type,
            data: Some(data),
        } => match mime_type.as_str() {
            TEXT_HTML => decode_leaf(data, BodyKind::Html),
            TEXT_PLAIN => decode_leaf(data, BodyKind::Plain),
            _ => None,
        },
        MimeNode::Leaf { data: None, .. } => None,
    }
}

/// Extract the body of a Gmail payload.
pub fn extract_payload(payload: &MessagePart) -> Option<ExtractedBody> {
    extract(&MimeNode::from(payload))
}

/// Decode Gmail body data (URL-safe base64) to text.
pub fn decode_body_data(data: &str) -> Result<String, base64::DecodeError> {
    let bytes = GMAIL_BASE64.decode(data.trim())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn decode_leaf(data: &str, kind: BodyKind) -> Option<ExtractedBody> {
    match decode_body_data(data) {
        Ok(text) => Some(ExtractedBody { kind, text }),
        Err(e) => {
            warn!(error = %e, "Undecodable body data, treating as empty");
            None
        }
    }
}
