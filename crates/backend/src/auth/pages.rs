//! HTML pages for the login flow.

const STYLE: &str = "\
    body { font-family: 'Inter', sans-serif; display: flex; align-items: center; justify-content: center; min-height: 100vh; margin: 0; background: #f9fafb; }
    .card { background: white; padding: 48px; border-radius: 16px; box-shadow: 0 4px 24px rgba(0,0,0,0.1); text-align: center; max-width: 450px; }
    h1 { margin-bottom: 16px; font-size: 24px; }
    h1.error { color: #ef4444; }
    h1.info { color: #333; }
    p { color: #666; margin-bottom: 24px; }
    .email { font-weight: 600; color: #333; background: #f3f4f6; padding: 8px 16px; border-radius: 8px; display: inline-block; margin: 8px 0 24px; }
    a { display: inline-block; background: #f97316; color: white; padding: 12px 24px; border-radius: 8px; text-decoration: none; font-weight: 500; }
    a:hover { background: #ea580c; }
    a.muted { background: #6b7280; }
    a.muted:hover { background: #4b5563; }";

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title}</title>
  <link href="https://fonts.googleapis.com/css2?family=Inter:wght@400;500;600&display=swap" rel="stylesheet">
  <style>
{STYLE}
  </style>
</head>
<body>
  <div class="card">
{body}
  </div>
</body>
</html>"#
    )
}

/// Escape text for interpolation into HTML.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn render_error(message: &str) -> String {
    layout(
        "Authentication Error",
        &format!(
            r#"    <h1 class="error">Authentication Error</h1>
    <p>{}</p>
    <a href="/api/auth/login">Try Again</a>"#,
            escape_html(message)
        ),
    )
}

/// Shown when a provider login succeeded but the email is not allowed.
/// Names the rejected email, never the allow-list.
pub fn render_access_denied(email: &str) -> String {
    layout(
        "Access Denied",
        &format!(
            r#"    <h1 class="error">Access Denied</h1>
    <p>Sorry, your email is not authorized to access this dashboard.</p>
    <div class="email">{}</div>
    <p>Contact an administrator to request access.</p>
    <a class="muted" href="/api/auth/logout">Sign Out</a>"#,
            escape_html(email)
        ),
    )
}

pub fn render_signed_out() -> String {
    layout(
        "Signed Out",
        r#"    <h1 class="info">Signed Out</h1>
    <p>You have been signed out successfully.</p>
    <a href="/api/auth/login">Sign In Again</a>"#,
    )
}
