//! Inbound-message classification.
//!
//! Messages are classified by substring containment over the lowercased body,
//! using an ordered rule table where the first match wins. Rules that act on
//! behalf of the user embed the authentication check in their predicate, so an
//! unauthenticated "create my poster" falls through to the generative
//! fallback, while "upload" and "connect" always match and prompt for
//! authentication inside their flow.

/// Keywords that trigger the search/export flow. They are stripped from the
/// message to form the search query.
pub const EXPORT_KEYWORDS: &[&str] = &["list", "show me", "get me", "download", "export"];

/// What the gateway should do with an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// The user announced an upload; prompt them to send the asset.
    Upload,
    /// An attachment arrived from an authenticated user; upload it.
    UploadMedia { media_url: String },
    /// The user wants to connect their account.
    Connect,
    /// Create a preset design with the given title.
    Create { title: String },
    /// Search designs and export the first match.
    Export { query: String },
    /// Unrecognized input, forwarded to the generative fallback verbatim.
    Freeform { text: String },
}

struct Ctx<'a> {
    text: &'a str,
    media_url: Option<&'a str>,
    authenticated: bool,
}

type Predicate = for<'a> fn(&Ctx<'a>) -> bool;
type Build = for<'a> fn(&Ctx<'a>) -> Intent;

const RULES: [(Predicate, Build); 5] = [
    (wants_upload, build_upload),
    (carries_media, build_media),
    (wants_connect, build_connect),
    (wants_create, build_create),
    (wants_export, build_export),
];

/// Classifies one inbound message. `media_url` is the first attachment, if
/// any; `authenticated` reflects whether a token exists for the sender's
/// session.
pub fn classify(body: &str, media_url: Option<&str>, authenticated: bool) -> Intent {
    let text = body.to_lowercase();
    let ctx = Ctx {
        text: &text,
        media_url,
        authenticated,
    };
    for (matches, build) in RULES {
        if matches(&ctx) {
            return build(&ctx);
        }
    }
    Intent::Freeform {
        text: body.trim().to_string(),
    }
}

fn wants_upload(ctx: &Ctx<'_>) -> bool {
    ctx.text.contains("upload")
}

fn carries_media(ctx: &Ctx<'_>) -> bool {
    ctx.media_url.is_some_and(|url| !url.is_empty()) && ctx.authenticated
}

fn wants_connect(ctx: &Ctx<'_>) -> bool {
    ctx.text.contains("connect")
}

fn wants_create(ctx: &Ctx<'_>) -> bool {
    ctx.text.contains("create") && ctx.authenticated
}

fn wants_export(ctx: &Ctx<'_>) -> bool {
    ctx.authenticated && EXPORT_KEYWORDS.iter().any(|kw| ctx.text.contains(kw))
}

fn build_upload(_ctx: &Ctx<'_>) -> Intent {
    Intent::Upload
}

fn build_media(ctx: &Ctx<'_>) -> Intent {
    Intent::UploadMedia {
        media_url: ctx.media_url.unwrap_or_default().to_string(),
    }
}

fn build_connect(_ctx: &Ctx<'_>) -> Intent {
    Intent::Connect
}

fn build_create(ctx: &Ctx<'_>) -> Intent {
    Intent::Create {
        title: collapse_whitespace(&ctx.text.replace("create", "")),
    }
}

fn build_export(ctx: &Ctx<'_>) -> Intent {
    Intent::Export {
        query: strip_export_keywords(ctx.text),
    }
}

/// Removes every export trigger keyword and normalizes whitespace, producing
/// the search query sent to the platform.
pub fn strip_export_keywords(text: &str) -> String {
    let mut out = text.to_string();
    for kw in EXPORT_KEYWORDS {
        out = out.replace(kw, "");
    }
    collapse_whitespace(&out)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
