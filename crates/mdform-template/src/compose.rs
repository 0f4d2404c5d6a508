//! Template composition.
//!
//! Formatted markup is a fragment. To render it inside a site layout it is
//! wrapped so that it extends a parent template and fills one of its blocks,
//! keeping the block's original content in front.

/// Wraps `html` so it extends `extends` and fills `block`.
///
/// Either part may be absent: without `block` the fragment is not wrapped in a
/// block, and without `extends` no parent is declared.
///
/// # Examples
///
/// ```
/// use mdform_template::wrap_template;
///
/// assert_eq!(
///     wrap_template("<p>hi</p>", Some("form.html"), Some("innerform")),
///     "{%- extends \"form.html\" %}\n{% block innerform %}{{ super() }}<p>hi</p>{% endblock %}"
/// );
/// assert_eq!(wrap_template("<p>hi</p>", None, None), "<p>hi</p>");
/// ```
pub fn wrap_template(html: &str, extends: Option<&str>, block: Option<&str>) -> String {
    let mut out = String::with_capacity(html.len() + 96);

    if let Some(parent) = extends.filter(|p| !p.is_empty()) {
        out.push_str("{%- extends \"");
        out.push_str(parent);
        out.push_str("\" %}\n");
    }

    match block.filter(|b| !b.is_empty()) {
        Some(block) => {
            out.push_str("{% block ");
            out.push_str(block);
            out.push_str(" %}{{ super() }}");
            out.push_str(html);
            out.push_str("{% endblock %}");
        }
        None => out.push_str(html),
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_only() {
        assert_eq!(
            wrap_template("x", None, Some("content")),
            "{% block content %}{{ super() }}x{% endblock %}"
        );
    }

    #[test]
    fn test_extends_only() {
        assert_eq!(
            wrap_template("x", Some("base.html"), None),
            "{%- extends \"base.html\" %}\nx"
        );
    }

    #[test]
    fn test_empty_names_are_ignored() {
        assert_eq!(wrap_template("x", Some(""), Some("")), "x");
    }
}
