//! Server-side page renderer.
//!
//! Every page request replays the whole session into HTML: the settings
//! sidebar, then either the "choose settings" notice or the full
//! transcript followed by the chat input. Rendering never mutates the
//! session. Turn text is rendered as Markdown with raw HTML escaped;
//! every other dynamic string is HTML-escaped.

use std::fmt::Write as _;

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

use crate::session::{Experience, History, Module, PLACEHOLDER, Role, Session, SessionId};

const MAIN_TITLE: &str = "🎓 AI Mentorship Session";
const NOT_STARTED_NOTICE: &str =
    "Please set your Module and Experience in the sidebar to begin.";

const STYLE: &str = r#"
  @import url('https://fonts.googleapis.com/css2?family=Inter:wght@400;600;700&display=swap');
  *, *::before, *::after { box-sizing: border-box; }
  html, body { margin: 0; height: 100%; font-family: 'Inter', system-ui, sans-serif; }
  body { display: flex; background: #f8fafc; color: #0f172a; }
  .sidebar { width: 280px; flex-shrink: 0; padding: 1.5rem; background: #0f172a; color: #e2e8f0; }
  .sidebar h2 { margin-top: 0; }
  .sidebar label { display: block; font-size: 0.85rem; margin: 1rem 0 0.3rem; }
  .sidebar select { width: 100%; padding: 0.4rem; border-radius: 6px; }
  .sidebar hr { border: none; border-top: 1px solid #334155; margin: 1.2rem 0; }
  .sidebar button { width: 100%; padding: 0.5rem; border-radius: 6px; border: 1px solid #475569;
                    background: #1e293b; color: #e2e8f0; cursor: pointer; }
  .sidebar .error { margin-top: 0.8rem; padding: 0.6rem; border-radius: 6px;
                    background: #7f1d1d; color: #fee2e2; font-size: 0.85rem; }
  .main { flex: 1; display: flex; flex-direction: column; padding: 1.5rem 2rem; min-width: 0; }
  .info { padding: 0.8rem 1rem; border-radius: 8px; background: #e0f2fe; color: #075985; }
  .banner { padding: 0.8rem 1rem; border-radius: 8px; background: #fee2e2; color: #991b1b;
            margin-bottom: 1rem; white-space: pre-wrap; }
  .chat-log { flex: 1; overflow-y: auto; }
  .chat-message { border-radius: 10px; padding: 15px; margin-bottom: 10px; border: 1px solid #e2e8f0;
                  background: #fff; display: flex; gap: 0.8rem; }
  .chat-message.user { background: #f1f5f9; }
  .avatar { font-size: 1.4rem; line-height: 1; }
  .role-label { font-weight: 700; font-size: 0.75rem; color: #8892b0; display: block;
                letter-spacing: 0.1em; text-transform: uppercase; margin-bottom: 4px; }
  .text { word-wrap: break-word; min-width: 0; }
  .text > :first-child { margin-top: 0; }
  .text > :last-child { margin-bottom: 0; }
  .text pre { background: #0f172a; color: #e2e8f0; padding: 0.8rem; border-radius: 6px; overflow-x: auto; }
  .text code { font-family: ui-monospace, SFMono-Regular, Menlo, monospace; font-size: 0.9em; }
  .text table { border-collapse: collapse; }
  .text th, .text td { border: 1px solid #cbd5e1; padding: 0.3rem 0.6rem; }
  .chat-input { display: flex; gap: 0.5rem; padding-top: 1rem; }
  .chat-input input { flex: 1; padding: 0.7rem; border-radius: 8px; border: 1px solid #cbd5e1; }
  .chat-input button { padding: 0.7rem 1.2rem; border-radius: 8px; border: none;
                       background: #0f172a; color: #fff; cursor: pointer; }
"#;

const SCROLL_SCRIPT: &str = r#"
  const log = document.getElementById('chat-log');
  if (log) { log.scrollTop = log.scrollHeight; }
"#;

/// Something to show on top of the normal page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Selector problem, shown under the initialize button.
    Validation(String),
    /// Request failure, shown above the transcript.
    Failure(String),
}

/// Everything the page needs for one render.
pub struct PageContext<'a> {
    pub title: &'a str,
    pub session_id: SessionId,
    pub session: &'a Session,
    pub notice: Option<Notice>,
    /// Selector values to keep after a rejected initialize.
    pub selected_module: Option<&'a str>,
    pub selected_experience: Option<&'a str>,
}

/// Escape text for safe inclusion in HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Markdown to HTML. Raw HTML in the source is shown as text and
/// script-capable link targets are dropped.
pub fn render_markdown(text: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let events = Parser::new_ext(text, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link { link_type, dest_url, title, id }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image { link_type, dest_url, title, id }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let scheme = url.trim_start().to_ascii_lowercase();
    if ["javascript:", "vbscript:", "data:"].iter().any(|s| scheme.starts_with(s)) {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

/// Render the history in conversation order.
pub fn render_transcript(history: &History) -> String {
    let mut out = String::new();
    for turn in history {
        let role = turn.role();
        let class = match role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        let _ = write!(
            out,
            r#"<div class="chat-message {class}"><span class="avatar">{avatar}</span><div><span class="role-label">{label}</span><div class="text">{text}</div></div></div>"#,
            avatar = role.avatar(),
            label = role.display_label(),
            text = render_markdown(turn.text()),
        );
        out.push('\n');
    }
    out
}

pub fn render_page(ctx: &PageContext<'_>) -> String {
    let mut html = String::with_capacity(4096);
    let _ = write!(
        html,
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1" />
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
"#,
        title = escape_html(ctx.title),
    );

    render_sidebar(&mut html, ctx);
    render_main(&mut html, ctx);

    let _ = write!(html, "<script>{SCROLL_SCRIPT}</script>\n</body>\n</html>\n");
    html
}

fn render_sidebar(html: &mut String, ctx: &PageContext<'_>) {
    let id = ctx.session_id;
    let session = ctx.session;

    html.push_str("<aside class=\"sidebar\">\n<h2>Settings</h2>\n");

    match (session.module(), session.experience()) {
        (Some(module), Some(experience)) => {
            let _ = write!(
                html,
                r#"<p><strong>Topic:</strong> {module}</p>
<p><strong>Level:</strong> Senior ({years}y)</p>
<hr />
<form method="post" action="/s/{id}/reset"><button type="submit">Reset Session</button></form>
"#,
                module = escape_html(module.label()),
                years = experience.years(),
            );
        }
        _ => {
            let _ = write!(
                html,
                r#"<form method="post" action="/s/{id}/initialize">
<label for="module">Module</label>
<select id="module" name="module">{modules}</select>
<label for="experience">Exp (Years)</label>
<select id="experience" name="experience">{levels}</select>
<hr />
<button type="submit">Initialize Mentor</button>
</form>
"#,
                modules = options(Module::ALL.iter().map(|m| m.label()), ctx.selected_module),
                levels = options(
                    Experience::ALL.iter().map(|e| e.label()),
                    ctx.selected_experience,
                ),
            );
            if let Some(Notice::Validation(msg)) = &ctx.notice {
                let _ = writeln!(html, r#"<div class="error">{}</div>"#, escape_html(msg));
            }
        }
    }

    html.push_str("</aside>\n");
}

fn render_main(html: &mut String, ctx: &PageContext<'_>) {
    let _ = writeln!(html, "<main class=\"main\">\n<h1>{MAIN_TITLE}</h1>");

    if let Some(Notice::Failure(msg)) = &ctx.notice {
        let _ = writeln!(html, r#"<div class="banner">{}</div>"#, escape_html(msg));
    }

    match ctx.session.module() {
        None => {
            let _ = writeln!(html, r#"<div class="info">{NOT_STARTED_NOTICE}</div>"#);
        }
        Some(module) => {
            let _ = write!(
                html,
                r#"<div id="chat-log" class="chat-log">
{transcript}</div>
<form class="chat-input" method="post" action="/s/{id}/message">
<input type="text" name="message" placeholder="Ask about {module}..." autocomplete="off" autofocus required />
<button type="submit">Send</button>
</form>
"#,
                transcript = render_transcript(ctx.session.history()),
                id = ctx.session_id,
                module = escape_html(module.label()),
            );
        }
    }

    html.push_str("</main>\n");
}

fn options<'a>(labels: impl Iterator<Item = &'a str>, selected: Option<&str>) -> String {
    let selected = selected.map(str::trim);
    let mut out = format!(r#"<option value="">{PLACEHOLDER}</option>"#);
    for label in labels {
        let attr = if selected == Some(label) { " selected" } else { "" };
        let label = escape_html(label);
        let _ = write!(out, r#"<option value="{label}"{attr}>{label}</option>"#);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(session: &Session, notice: Option<Notice>) -> String {
        render_page(&PageContext {
            title: "AI Chatbot Mentor",
            session_id: SessionId::new(),
            session,
            notice,
            selected_module: None,
            selected_experience: None,
        })
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<b>"x" & 'y'</b>"#),
            "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn transcript_preserves_order_and_labels() {
        let mut s = Session::default();
        s.initialize(Some("SQL"), Some("3")).unwrap();
        s.begin_turn("What is a primary key?").unwrap();
        s.record_reply("A unique identifier.").unwrap();

        let html = render_transcript(s.history());
        let learner = html.find("LEARNER").unwrap();
        let mentor = html.find("MENTOR").unwrap();
        assert!(learner < mentor);
        assert!(html.find("What is a primary key?").unwrap() < html.find("A unique identifier.").unwrap());
    }

    #[test]
    fn transcript_escapes_model_output() {
        let mut s = Session::default();
        s.initialize(Some("Python"), Some("1")).unwrap();
        s.begin_turn("<script>alert(1)</script>").unwrap();
        let html = render_transcript(s.history());
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn reply_markdown_is_formatted() {
        let reply = "Use **indexes**:\n\n```sql\nCREATE INDEX idx ON t (c);\n```\n\n- one\n- two\n";
        let html = render_markdown(reply);
        assert!(html.contains("<strong>indexes</strong>"));
        assert!(html.contains(r#"<pre><code class="language-sql">CREATE INDEX idx ON t (c);"#));
        assert!(html.contains("<li>one</li>"));
    }

    #[test]
    fn markdown_never_passes_raw_html_or_script_links() {
        let html = render_markdown("<img src=x onerror=alert(1)> and [click](javascript:alert(1))");
        assert!(!html.contains("<img"));
        assert!(html.contains("&lt;img"));
        assert!(!html.contains("javascript:"));
        assert!(html.contains(r##"<a href="#">click</a>"##));
    }

    #[test]
    fn assistant_turn_renders_markdown_in_transcript() {
        let mut s = Session::default();
        s.initialize(Some("SQL"), Some("3")).unwrap();
        s.begin_turn("How do I filter?").unwrap();
        s.record_reply("Add a `WHERE` clause.").unwrap();
        let html = render_transcript(s.history());
        assert!(html.contains("<code>WHERE</code>"));
    }

    #[test]
    fn awaiting_settings_page_shows_selectors_and_notice() {
        let html = page(&Session::default(), None);
        assert!(html.contains("<title>AI Chatbot Mentor</title>"));
        assert!(html.contains("Initialize Mentor"));
        assert!(html.contains(PLACEHOLDER));
        assert!(html.contains(r#"<option value="Generative AI (Gen AI)">"#));
        assert!(html.contains(r#"<option value="15">"#));
        assert!(html.contains(NOT_STARTED_NOTICE));
        assert!(!html.contains("chat-input"));
    }

    #[test]
    fn validation_notice_is_rendered_in_sidebar() {
        let html = page(&Session::default(), Some(Notice::Validation("Please select all fields.".into())));
        assert!(html.contains(r#"<div class="error">Please select all fields.</div>"#));
    }

    #[test]
    fn prior_selection_is_kept() {
        let session = Session::default();
        let html = render_page(&PageContext {
            title: "t",
            session_id: SessionId::new(),
            session: &session,
            notice: Some(Notice::Validation("Please select all fields.".into())),
            selected_module: Some("SQL"),
            selected_experience: None,
        });
        assert!(html.contains(r#"<option value="SQL" selected>SQL</option>"#));
        assert!(!html.contains(r#"<option value="3" selected>"#));
    }

    #[test]
    fn ready_page_shows_settings_summary_and_input() {
        let mut s = Session::default();
        s.initialize(Some("Power BI"), Some("11")).unwrap();
        let html = page(&s, None);
        assert!(html.contains("<strong>Topic:</strong> Power BI"));
        assert!(html.contains("Senior (11y)"));
        assert!(html.contains("Reset Session"));
        assert!(html.contains(r#"placeholder="Ask about Power BI...""#));
        assert!(!html.contains("Initialize Mentor"));
        assert!(!html.contains(NOT_STARTED_NOTICE));
    }

    #[test]
    fn failure_banner_is_rendered() {
        let mut s = Session::default();
        s.initialize(Some("EDA"), Some("2")).unwrap();
        let html = page(&s, Some(Notice::Failure("provider request failed: HTTP 401".into())));
        assert!(html.contains(r#"<div class="banner">provider request failed: HTTP 401</div>"#));
    }
}
