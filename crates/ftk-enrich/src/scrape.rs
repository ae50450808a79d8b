//! Minimal HTML scanning for the descriptive-page image.
//!
//! The museum pages carry the vessel photo as the first `<img>` inside a
//! `<figure class="image">` element. A full HTML parser is overkill for that
//! one shape, so this is a small case-insensitive scanner over the raw text.

/// Find the `src` of the first `<img>` inside a `<figure class="image">`.
///
/// Returns `None` when the page has no such figure, the figure has no img,
/// or the img has no usable `src` attribute.
pub fn first_figure_image_src(html: &str) -> Option<&str> {
    let lower = html.to_ascii_lowercase();

    let mut from = 0usize;
    loop {
        let fig_start = lower[from..].find("<figure")?;
        let fig_start = from + fig_start;
        let tag_end = fig_start + lower[fig_start..].find('>')?;

        let open_tag = &lower[fig_start..tag_end];
        if tag_has_image_class(open_tag) {
            let fig_end = tag_end
                + lower[tag_end..]
                    .find("</figure")
                    .unwrap_or(lower.len() - tag_end);
            return img_src_in(html, &lower, tag_end, fig_end);
        }
        from = tag_end;
    }
}

fn tag_has_image_class(open_tag: &str) -> bool {
    let Some(pos) = open_tag.find("class=") else {
        return false;
    };
    let rest = &open_tag[pos + "class=".len()..];
    let classes = match rest.as_bytes().first() {
        Some(b'"') | Some(b'\'') => {
            let quote = rest.as_bytes()[0] as char;
            match rest[1..].find(quote) {
                Some(end) => &rest[1..1 + end],
                None => return false,
            }
        }
        _ => rest.split_whitespace().next().unwrap_or(""),
    };
    classes.split_whitespace().any(|c| c == "image")
}

fn img_src_in<'a>(
    html: &'a str,
    lower: &str,
    start: usize,
    end: usize,
) -> Option<&'a str> {
    let img = start + lower[start..end].find("<img")?;
    let img_end = img + lower[img..end].find('>')?;
    let src = img + lower[img..img_end].find("src=")?;

    let value_start = src + "src=".len();
    let bytes = html.as_bytes();
    let quote = *bytes.get(value_start)?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let rest = &html[value_start + 1..img_end];
    let close = rest.find(quote as char)?;
    let value = &rest[..close];
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
