//! Display surface that `info` renders into.

/// Opaque sink for rendered markup. Connectors write to it; they never read it back.
pub trait DisplaySurface: Send {
    /// Replace the surface's content.
    fn render(&mut self, markup: String);
}

impl DisplaySurface for String {
    fn render(&mut self, markup: String) {
        *self = markup;
    }
}

/// Escape text for inclusion in an HTML fragment.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_surface_replaces_content() {
        let mut surface = String::from("old");
        surface.render("<p>new</p>".to_string());
        assert_eq!(surface, "<p>new</p>");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"Tom\" & 'Jerry'</b>"), "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;");
    }
}
