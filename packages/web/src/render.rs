//! Server-side page rendering
//!
//! Pages are plain strings assembled around a common shell with navigation
//! and the page body. No template engine: the handlers hold the data, this
//! module holds the markup.

use onebase_core::models::{Key, Node, Path, RowRecord, RowSet, SoftType};
use onebase_core::services::Authenticated;

use crate::forms::{FieldKind, Form};

/// Escape text for safe embedding in HTML.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

/// Percent-encode a string for use inside a URL query value.
pub fn urlencode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

const STYLE: &str = "
body { font-family: sans-serif; margin: 0; color: #222; }
nav { background: #2d3e50; padding: 0.6rem 1rem; }
nav a { color: #ecf0f1; margin-right: 1rem; text-decoration: none; }
nav .session { float: right; color: #bdc3c7; }
nav .session a { margin: 0 0 0 1rem; }
main { padding: 1rem 1.5rem; max-width: 60rem; }
table { border-collapse: collapse; margin: 1rem 0; }
th, td { border: 1px solid #ccc; padding: 0.3rem 0.6rem; text-align: left; }
th { background: #f4f4f4; }
form p { margin: 0.5rem 0; }
label { display: inline-block; min-width: 10rem; vertical-align: top; }
.errors, .field-errors { color: #c0392b; margin: 0.25rem 0; padding-left: 1.2rem; }
.actions a { margin-right: 1rem; }
.muted { color: #7f8c8d; }
";

/// Render the common page shell around a body fragment.
pub fn page(title: &str, user: Option<&Authenticated>, content: &str) -> String {
    let session = match user {
        Some(auth) => format!(
            "<span class=\"session\">{} <a href=\"/auth/logout\">Log Out</a></span>",
            escape(&auth.user.email)
        ),
        None => "<span class=\"session\"><a href=\"/auth/login\">Log In</a> \
             <a href=\"/auth/register\">Register</a></span>"
            .to_string(),
    };

    let mut html = String::with_capacity(2048);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{} - 1Base</title>\n", escape(title)));
    html.push_str(&format!("<style>{}</style>\n", STYLE));
    html.push_str("</head>\n<body>\n<nav>");
    html.push_str("<a href=\"/\">1Base</a>");
    html.push_str("<a href=\"/node/browse\">Browse</a>");
    html.push_str("<a href=\"/type/\">Types</a>");
    html.push_str(&session);
    html.push_str("</nav>\n<main>\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape(title)));
    html.push_str(content);
    html.push_str("\n</main>\n</body>\n</html>\n");
    html
}

fn field_control(field: &crate::forms::FormField) -> String {
    let name = escape(&field.name);
    let value = escape(&field.value);
    match &field.kind {
        FieldKind::Text => {
            format!("<input type=\"text\" name=\"{name}\" value=\"{value}\">")
        }
        FieldKind::Password => format!("<input type=\"password\" name=\"{name}\">"),
        FieldKind::Email => {
            format!("<input type=\"email\" name=\"{name}\" value=\"{value}\">")
        }
        FieldKind::Hidden => {
            format!("<input type=\"hidden\" name=\"{name}\" value=\"{value}\">")
        }
        FieldKind::TextArea => {
            format!("<textarea name=\"{name}\" rows=\"4\" cols=\"48\">{value}</textarea>")
        }
        FieldKind::Integer => {
            format!("<input type=\"number\" name=\"{name}\" value=\"{value}\">")
        }
        FieldKind::Checkbox => {
            let checked = if field.value.is_empty() { "" } else { " checked" };
            format!("<input type=\"checkbox\" name=\"{name}\" value=\"true\"{checked}>")
        }
        FieldKind::Select(options) => {
            let mut html = format!("<select name=\"{name}\">");
            for (option_value, option_label) in options {
                let selected = if *option_value == field.value {
                    " selected"
                } else {
                    ""
                };
                html.push_str(&format!(
                    "<option value=\"{}\"{selected}>{}</option>",
                    escape(option_value),
                    escape(option_label)
                ));
            }
            html.push_str("</select>");
            html
        }
    }
}

/// Render a form with inline field errors.
pub fn render_form(form: &Form, action: &str, submit: &str) -> String {
    let mut html = String::with_capacity(1024);
    if !form.errors.is_empty() {
        html.push_str("<ul class=\"errors\">");
        for error in &form.errors {
            html.push_str(&format!("<li>{}</li>", escape(error)));
        }
        html.push_str("</ul>\n");
    }
    html.push_str(&format!(
        "<form method=\"post\" action=\"{}\">\n",
        escape(action)
    ));
    for field in &form.fields {
        if field.kind == FieldKind::Hidden {
            html.push_str(&field_control(field));
            html.push('\n');
            continue;
        }
        html.push_str("<p>");
        html.push_str(&format!(
            "<label for=\"{0}\">{1}</label>",
            escape(&field.name),
            escape(&field.label)
        ));
        html.push_str(&field_control(field));
        if !field.errors.is_empty() {
            html.push_str("<ul class=\"field-errors\">");
            for error in &field.errors {
                html.push_str(&format!("<li>{}</li>", escape(error)));
            }
            html.push_str("</ul>");
        }
        html.push_str("</p>\n");
    }
    html.push_str(&format!(
        "<p><button type=\"submit\">{}</button></p>\n</form>\n",
        escape(submit)
    ));
    html
}

/// Dedicated error page for coded application failures.
pub fn error_page(code: &str, message: &str) -> String {
    let body = format!(
        "<p>{}</p>\n<p class=\"muted\">Error code {}</p>\n<p><a href=\"/\">Back home</a></p>",
        escape(message),
        escape(code)
    );
    page(code, None, &body)
}

/// Index landing page.
pub fn index_page(user: Option<&Authenticated>) -> String {
    let body = "<p>A small self-hosted document/record database.</p>\n\
        <p><a href=\"/node/browse\">Browse paths &amp; nodes</a> or \
        <a href=\"/type/\">inspect the type registry</a>.</p>";
    page("Home", user, body)
}

/// Login page with optional `next` round trip.
pub fn login_page(form: &Form, next: Option<&str>, user: Option<&Authenticated>) -> String {
    let action = match next {
        Some(next) => format!("/auth/login?next={}", urlencode(next)),
        None => "/auth/login".to_string(),
    };
    page("Log In", user, &render_form(form, &action, "Log In"))
}

/// Registration page.
pub fn register_page(form: &Form, user: Option<&Authenticated>) -> String {
    page("Register", user, &render_form(form, "/auth/register", "Register"))
}

/// Post-registration page.
pub fn register_done_page(email: &str, user: Option<&Authenticated>) -> String {
    let body = format!(
        "<p>Account created for {}.</p>\n\
         <p>Check your email for the verification link before logging in.</p>",
        escape(email)
    );
    page("Register", user, &body)
}

/// Account verification result page.
pub fn validate_page(verified_email: Option<&str>, user: Option<&Authenticated>) -> String {
    let body = match verified_email {
        Some(email) => format!(
            "<p>Account {} verified. You can <a href=\"/auth/login\">log in</a> now.</p>",
            escape(email)
        ),
        None => "<ul class=\"errors\"><li>Verification key invalid.</li></ul>".to_string(),
    };
    page("User Account Verification", user, &body)
}

fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{}/{}", parent, child)
    }
}

/// Path browser: children of the current path, or the roots.
pub fn browse_page(
    path: &str,
    current: Option<&Path>,
    children: &[Path],
    user: Option<&Authenticated>,
) -> String {
    let title = if path.is_empty() {
        "Browse Paths & Nodes".to_string()
    } else {
        path.to_string()
    };

    let mut body = String::new();
    if !path.is_empty() && current.is_none() {
        body.push_str("<p class=\"muted\">No such path.</p>\n");
    }
    if children.is_empty() {
        body.push_str("<p class=\"muted\">No child paths.</p>\n");
    } else {
        body.push_str("<ul>\n");
        for child in children {
            let full = join_path(path, &child.name);
            body.push_str(&format!(
                "<li><a href=\"/node/browse?path={}\">{}</a></li>\n",
                urlencode(&full),
                escape(&child.name)
            ));
        }
        body.push_str("</ul>\n");
    }
    body.push_str(&format!(
        "<p class=\"actions\"><a href=\"/node/create?path={}\">Create a node here</a></p>\n",
        urlencode(&join_path(path, "")),
    ));
    page(&title, user, &body)
}

/// Search result when the path resolves to nothing.
pub fn no_node_page(path: &str, user: Option<&Authenticated>) -> String {
    let body = format!(
        "<p class=\"muted\">No node at <code>{}</code>.</p>\n\
         <p><a href=\"/node/browse\">Browse paths</a></p>",
        escape(path)
    );
    page("No Node", user, &body)
}

/// The node view: keys as columns, one row per populated record.
pub fn node_page(
    node: &Node,
    keys: &[Key],
    rowset: &RowSet,
    path: &str,
    user: Option<&Authenticated>,
) -> String {
    let encoded_path = urlencode(path);
    let mut body = String::with_capacity(2048);

    if !node.description.is_empty() {
        body.push_str(&format!("<p>{}</p>\n", escape(&node.description)));
    }

    body.push_str(&format!(
        "<form method=\"post\" action=\"/node/search?path={encoded_path}\">\n<table>\n<tr><th></th><th>#</th>"
    ));
    for key in keys {
        body.push_str(&format!("<th>{}</th>", escape(&key.name)));
    }
    body.push_str("<th></th></tr>\n");

    for record in &rowset.rows {
        body.push_str(&format!(
            "<tr><td><input type=\"checkbox\" name=\"select_row\" value=\"{0}\"></td><td>{0}</td>",
            record.row
        ));
        for value in &record.values {
            match value {
                Some(value) => body.push_str(&format!("<td>{}</td>", escape(value))),
                None => body.push_str("<td class=\"muted\">&mdash;</td>"),
            }
        }
        body.push_str(&format!(
            "<td><a href=\"/node/slot/update/{}?path={encoded_path}\">edit</a></td></tr>\n",
            record.row
        ));
    }
    body.push_str("</table>\n");
    body.push_str(
        "<p><button type=\"submit\" name=\"DELETE\" value=\"1\">Delete selected rows</button></p>\n</form>\n",
    );

    body.push_str(&format!(
        "<p class=\"muted\">Rows {}&ndash;{} of {}</p>\n",
        rowset.start, rowset.end, rowset.total
    ));
    body.push_str(&format!(
        "<p class=\"actions\"><a href=\"/node/slot/add?path={encoded_path}\">Insert row</a>\
         <a href=\"/node/browse\">Browse</a></p>\n"
    ));

    page(&format!("Node: {}", node.title), user, &body)
}

/// Node creation page with the add-key affordance.
pub fn create_node_page(
    form: &Form,
    path: &str,
    add_key_url: &str,
    user: Option<&Authenticated>,
) -> String {
    let action = format!("/node/create?path={}", urlencode(path));
    let mut body = render_form(form, &action, "Create Node");
    body.push_str(&format!(
        "<p class=\"actions\"><a href=\"{}\">Add another key</a></p>\n",
        escape(add_key_url)
    ));
    page("Create Node", user, &body)
}

/// Insert/update slot page around a dynamic form.
pub fn slot_page(
    title: &str,
    form: &Form,
    action: &str,
    user: Option<&Authenticated>,
) -> String {
    page(title, user, &render_form(form, action, "Save"))
}

/// Row drop confirmation page.
pub fn drop_confirm_page(
    keys: &[Key],
    rows: &[RowRecord],
    path: &str,
    rows_param: &str,
    user: Option<&Authenticated>,
) -> String {
    let mut body = String::from("<p>Delete these rows?</p>\n<table>\n<tr><th>#</th>");
    for key in keys {
        body.push_str(&format!("<th>{}</th>", escape(&key.name)));
    }
    body.push_str("</tr>\n");
    for record in rows {
        body.push_str(&format!("<tr><td>{}</td>", record.row));
        for value in &record.values {
            match value {
                Some(value) => body.push_str(&format!("<td>{}</td>", escape(value))),
                None => body.push_str("<td class=\"muted\">&mdash;</td>"),
            }
        }
        body.push_str("</tr>\n");
    }
    body.push_str("</table>\n");
    body.push_str(&format!(
        "<form method=\"post\" action=\"/node/slot/drop?path={}&rows={}\">\n\
         <button type=\"submit\" name=\"YES\" value=\"1\">Yes, delete</button>\n</form>\n\
         <p><a href=\"/node/search?path={}\">Cancel</a></p>\n",
        urlencode(path),
        urlencode(rows_param),
        urlencode(path)
    ));
    page("Drop Rows", user, &body)
}

/// Type registry listing.
pub fn types_list_page(types: &[SoftType], user: Option<&Authenticated>) -> String {
    let mut body = String::from("<table>\n<tr><th>Name</th><th>Primitive</th><th>Validator</th><th></th></tr>\n");
    for soft_type in types {
        body.push_str(&format!(
            "<tr><td><a href=\"/type/{}\">{}</a></td><td>{}</td><td>{}</td>\
             <td><a href=\"/type/{0}/modify\">modify</a> <a href=\"/type/{0}/delete\">delete</a></td></tr>\n",
            escape(&soft_type.id),
            escape(&soft_type.name),
            if soft_type.is_primitive { "yes" } else { "no" },
            escape(soft_type.validator.as_deref().unwrap_or("")),
        ));
    }
    body.push_str("</table>\n<p class=\"actions\"><a href=\"/type/create\">Create Type</a></p>\n");
    page("Types", user, &body)
}

/// Single type page.
pub fn type_show_page(soft_type: &SoftType, user: Option<&Authenticated>) -> String {
    let body = format!(
        "<table>\n\
         <tr><th>Name</th><td>{}</td></tr>\n\
         <tr><th>Representation URL</th><td>{}</td></tr>\n\
         <tr><th>Primitive</th><td>{}</td></tr>\n\
         <tr><th>Validator URL</th><td>{}</td></tr>\n\
         </table>\n\
         <p class=\"actions\"><a href=\"/type/{}/modify\">Modify</a>\
         <a href=\"/type/{4}/delete\">Delete</a> <a href=\"/type/\">All types</a></p>",
        escape(&soft_type.name),
        escape(&soft_type.repr),
        if soft_type.is_primitive { "yes" } else { "no" },
        escape(soft_type.validator.as_deref().unwrap_or("")),
        escape(&soft_type.id),
    );
    page(&soft_type.name, user, &body)
}

/// Type deletion confirmation page.
pub fn type_delete_page(soft_type: &SoftType, user: Option<&Authenticated>) -> String {
    let body = format!(
        "<p>Delete the type <strong>{}</strong>?</p>\n\
         <p class=\"actions\"><a href=\"/type/{}/delete?confirm=1\">Yes, delete</a>\
         <a href=\"/type/\">Cancel</a></p>",
        escape(&soft_type.name),
        escape(&soft_type.id),
    );
    page(&format!("Delete {}", soft_type.name), user, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms;

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>&\"'"), "&lt;b&gt;&amp;&quot;&#39;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_urlencode() {
        assert_eq!(urlencode("abc-123"), "abc-123");
        assert_eq!(urlencode("/a b?c=d"), "%2Fa%20b%3Fc%3Dd");
    }

    #[test]
    fn test_page_shell_shows_session_state() {
        let html = page("Home", None, "<p>hi</p>");
        assert!(html.contains("Log In"));
        assert!(html.contains("<p>hi</p>"));
    }

    #[test]
    fn test_form_renders_inline_errors() {
        let mut form = forms::login_form();
        form.add_field_error("email", "A valid email address is required");
        let html = render_form(&form, "/auth/login", "Log In");
        assert!(html.contains("field-errors"));
        assert!(html.contains("A valid email address is required"));
    }

    #[test]
    fn test_error_page_carries_code() {
        let html = error_page("E-201", "Permission denied");
        assert!(html.contains("E-201"));
        assert!(html.contains("Permission denied"));
    }

    #[test]
    fn test_user_values_are_escaped() {
        let mut form = forms::login_form();
        form.fields[0].value = "<script>alert(1)</script>".to_string();
        let html = render_form(&form, "/auth/login", "Log In");
        assert!(!html.contains("<script>alert(1)"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
