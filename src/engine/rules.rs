//! Base CommonMark rules
//!
//! These apply to every element no plugin rule claimed. Unknown elements are
//! transparent: their children are rendered in place.

use super::escape::escape_markdown;
use super::render::{Element, Renderer};
use crate::error::ConversionError;

/// Elements rendered as blank-line separated blocks
const BLOCK_ELEMENTS: &[&str] = &[
    "p",
    "div",
    "section",
    "article",
    "main",
    "header",
    "footer",
    "nav",
    "aside",
    "address",
    "figure",
    "figcaption",
    "details",
    "summary",
    "dl",
    "dt",
    "dd",
    "form",
    "fieldset",
    "legend",
    "center",
    "table",
    "caption",
    "tr",
];

/// Largest ordered list number CommonMark accepts (nine digits)
const MAX_LIST_NUMBER: u32 = 999_999_999;

/// Render `el` with the base rule for its tag.
pub(crate) fn render_base(el: &Element<'_>, r: &mut Renderer<'_>) -> Result<(), ConversionError> {
    match el.tag() {
        "h1" => heading(el, r, 1),
        "h2" => heading(el, r, 2),
        "h3" => heading(el, r, 3),
        "h4" => heading(el, r, 4),
        "h5" => heading(el, r, 5),
        "h6" => heading(el, r, 6),
        "strong" | "b" => r.wrap_inline(el, "**"),
        "em" | "i" => r.wrap_inline(el, "*"),
        "code" | "kbd" | "samp" | "tt" => {
            inline_code(el, r);
            Ok(())
        }
        "pre" => {
            code_block(el, r);
            Ok(())
        }
        "a" => link(el, r),
        "img" => {
            image(el, r);
            Ok(())
        }
        "ul" => list(el, r, false),
        "ol" => list(el, r, true),
        "blockquote" => blockquote(el, r),
        "hr" => {
            r.start_block();
            r.push_str("* * *");
            r.end_block();
            Ok(())
        }
        "br" => {
            r.push_line_break();
            Ok(())
        }
        "select" => {
            select(el, r);
            Ok(())
        }
        "td" | "th" => {
            r.push_space();
            r.render_children(el)?;
            r.push_space();
            Ok(())
        }
        tag if BLOCK_ELEMENTS.contains(&tag) => {
            r.start_block();
            r.render_children(el)?;
            r.end_block();
            Ok(())
        }
        _ => r.render_children(el),
    }
}

fn heading(el: &Element<'_>, r: &mut Renderer<'_>, level: usize) -> Result<(), ConversionError> {
    let content = r.capture(|r| r.render_children(el))?;
    let text = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return Ok(());
    }

    r.start_block();
    r.push_str(&"#".repeat(level));
    r.push_str(" ");
    r.push_str(&text);
    r.end_block();
    Ok(())
}

/// Longest run of consecutive backticks in `text`
pub fn longest_backtick_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Code span whose delimiter is longer than any backtick run inside it.
fn inline_code(el: &Element<'_>, r: &mut Renderer<'_>) {
    let content = el.text_content().replace(['\n', '\r'], " ");
    if content.trim().is_empty() {
        return;
    }

    let delimiter = "`".repeat(longest_backtick_run(&content) + 1);
    // A span starting or ending with a backtick needs padding to parse
    let padding = if content.starts_with('`') || content.ends_with('`') {
        " "
    } else {
        ""
    };
    r.push_str(&delimiter);
    r.push_str(padding);
    r.push_str(&content);
    r.push_str(padding);
    r.push_str(&delimiter);
}

/// `pre` as a triple-backtick fence.
fn code_block(el: &Element<'_>, r: &mut Renderer<'_>) {
    let language = el
        .find_child("code")
        .and_then(|code| Element::new(&code, el.depth() + 1).and_then(|code| language_class(&code)))
        .or_else(|| language_class(el))
        .unwrap_or_default();

    let text = el.text_content();
    let code = text.trim_end_matches(['\n', '\r']);
    r.push_fenced_block("```", &language, code);
}

fn language_class(el: &Element<'_>) -> Option<String> {
    el.classes().into_iter().find_map(|class| {
        class
            .strip_prefix("language-")
            .or_else(|| class.strip_prefix("lang-"))
            .filter(|lang| !lang.is_empty())
            .map(str::to_string)
    })
}

fn link(el: &Element<'_>, r: &mut Renderer<'_>) -> Result<(), ConversionError> {
    let target = el
        .attr("href")
        .and_then(|href| r.resolve_url(&href).map(|url| url.replace(' ', "%20")));
    let Some(target) = target else {
        // No usable target: keep the text only
        return r.render_children(el);
    };

    let content = r.capture(|r| r.render_children(el))?;
    if content.trim().is_empty() {
        return Ok(());
    }

    let close = match el.attr("title").map(|t| t.split_whitespace().collect::<Vec<_>>().join(" ")) {
        Some(title) if !title.is_empty() => {
            format!("]({target} \"{}\")", title.replace('"', "\\\""))
        }
        _ => format!("]({target})"),
    };
    r.push_wrapped(&content, "[", &close);
    Ok(())
}

fn image(el: &Element<'_>, r: &mut Renderer<'_>) {
    let Some(src) = el
        .attr("src")
        .and_then(|src| r.resolve_url(&src).map(|url| url.replace(' ', "%20")))
    else {
        return;
    };
    if src.is_empty() {
        return;
    }

    let alt = el
        .attr("alt")
        .map(|alt| alt.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();
    r.push_str("![");
    r.push_str(&escape_markdown(&alt, false));
    r.push_str("](");
    r.push_str(&src);
    if let Some(title) = el.attr("title").filter(|t| !t.trim().is_empty()) {
        r.push_str(" \"");
        r.push_str(&title.trim().replace('"', "\\\""));
        r.push_str("\"");
    }
    r.push_str(")");
}

fn list(el: &Element<'_>, r: &mut Renderer<'_>, ordered: bool) -> Result<(), ConversionError> {
    let mut number = if ordered { list_start(el) } else { 1 };

    let mut items: Vec<String> = Vec::new();
    let mut indent = 0;

    for child in el.children() {
        let Some(child_el) = Element::new(&child, el.depth() + 1) else {
            // Stray text between items
            let text = r.capture(|r| r.render_node(&child, el.depth() + 1))?;
            if !text.trim().is_empty() {
                items.push(indent_lines(text.trim(), indent));
            }
            continue;
        };

        if child_el.tag() != "li" {
            // Typically a nested list placed directly inside the parent list
            let content = r.capture(|r| r.render_node(&child, el.depth() + 1))?;
            let content = content.trim_matches('\n');
            if !content.trim().is_empty() {
                items.push(indent_lines(content, indent));
            }
            continue;
        }

        r.engine().security().validate_depth(child_el.depth())?;
        let marker = if ordered {
            format!("{number}. ")
        } else {
            "- ".to_string()
        };
        number = number.saturating_add(1).min(MAX_LIST_NUMBER);
        indent = marker.len();

        let content = r.capture_list_item(&child_el)?;
        items.push(list_item(&marker, content.trim()));
    }

    if items.is_empty() {
        return Ok(());
    }

    r.start_list();
    r.push_str(&items.join("\n"));
    r.end_list();
    Ok(())
}

/// First number of an ordered list, clamped to what a list marker can hold.
///
/// Negative starts become 0; unparsable ones fall back to 1.
fn list_start(el: &Element<'_>) -> u32 {
    el.attr("start")
        .and_then(|start| start.trim().parse::<i64>().ok())
        .map_or(1, |start| start.clamp(0, i64::from(MAX_LIST_NUMBER)) as u32)
}

/// Prefix the first line with `marker` and indent the rest under it.
fn list_item(marker: &str, content: &str) -> String {
    let mut item = String::with_capacity(marker.len() + content.len());
    item.push_str(marker);
    let mut lines = content.split('\n');
    if let Some(first) = lines.next() {
        item.push_str(first);
    }
    for line in lines {
        item.push('\n');
        if !line.is_empty() {
            item.push_str(&" ".repeat(marker.len()));
            item.push_str(line);
        }
    }
    item
}

fn indent_lines(content: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    content
        .split('\n')
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn blockquote(el: &Element<'_>, r: &mut Renderer<'_>) -> Result<(), ConversionError> {
    let content = r.capture(|r| r.render_children(el))?;
    let content = content.trim();
    if content.is_empty() {
        return Ok(());
    }

    let quoted = content
        .split('\n')
        .map(|line| {
            let line = line.trim_end();
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    r.start_block();
    r.push_str(&quoted);
    r.end_block();
    Ok(())
}

/// Options of a `<select>` as a comma-separated list.
///
/// Placeholder options (`value=""`) and disabled options are not real
/// choices and are skipped. A select with no remaining option disappears.
fn select(el: &Element<'_>, r: &mut Renderer<'_>) {
    let mut labels = Vec::new();
    collect_options(el, &mut labels);
    if labels.is_empty() {
        return;
    }

    r.push_space();
    r.push_text(&labels.join(", "));
    r.push_str(" ");
}

fn collect_options(el: &Element<'_>, labels: &mut Vec<String>) {
    for child in el.children() {
        let Some(child_el) = Element::new(&child, el.depth() + 1) else {
            continue;
        };
        match child_el.tag() {
            "option" => {
                if child_el.has_attr("disabled") || child_el.attr("value").as_deref() == Some("") {
                    continue;
                }
                let text = child_el.text_content();
                let label = match text.split_whitespace().collect::<Vec<_>>().join(" ") {
                    label if label.is_empty() => child_el
                        .attr("label")
                        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
                        .unwrap_or_default(),
                    label => label,
                };
                if !label.is_empty() {
                    labels.push(label);
                }
            }
            "optgroup" if !child_el.has_attr("disabled") => collect_options(&child_el, labels),
            _ => {}
        }
    }
}
