//! Custom askama filters. Template modules bring this in with `use crate::filters;`.

use std::fmt::Display;

/// Add a CSS class to the first element of a rendered form widget:
/// `{{ form.text_widget()|addclass("form-control")|safe }}`.
pub fn addclass<T: Display>(widget: T, css: &str) -> askama::Result<String> {
    Ok(add_class(&widget.to_string(), css))
}

pub fn add_class(html: &str, css: &str) -> String {
    let css = css.trim();
    if css.is_empty() {
        return html.to_string();
    }

    let Some(start) = html.find('<') else {
        return html.to_string();
    };
    let tag_end = html[start..]
        .find('>')
        .map(|i| start + i)
        .unwrap_or(html.len());
    let tag = &html[start..tag_end];

    if let Some(pos) = tag.find(" class=\"") {
        let insert_at = start + pos + " class=\"".len();
        let existing_end = html[insert_at..]
            .find('"')
            .map(|i| insert_at + i)
            .unwrap_or(insert_at);
        let separator = if existing_end > insert_at { " " } else { "" };
        let mut out = String::with_capacity(html.len() + css.len() + 1);
        out.push_str(&html[..existing_end]);
        out.push_str(separator);
        out.push_str(css);
        out.push_str(&html[existing_end..]);
        return out;
    }

    // Insert right after the tag name
    let name_end = tag
        .find(|c: char| c.is_whitespace() || c == '/')
        .map(|i| start + i)
        .unwrap_or(tag_end);
    format!(
        "{} class=\"{}\"{}",
        &html[..name_end],
        css,
        &html[name_end..]
    )
}
