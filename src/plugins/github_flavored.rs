//! GitHub-flavored Markdown extensions

use crate::engine::{Element, Plugin, Renderer, Rule, RuleOutcome};
use crate::error::ConversionError;

/// Widest `colspan` honoured; larger values are clamped
const MAX_COLSPAN: usize = 64;

/// Tables, strikethrough and task list items
///
/// ```rust
/// use html_md_converter::engine::Engine;
/// use html_md_converter::plugins::GitHubFlavored;
///
/// let mut engine = Engine::default();
/// engine.use_plugin(GitHubFlavored);
///
/// let html = "<table><tr><th>Name</th></tr><tr><td>Ada</td></tr></table>";
/// assert_eq!(engine.convert_str(html)?, "| Name |\n| --- |\n| Ada |");
/// # Ok::<(), html_md_converter::ConversionError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct GitHubFlavored;

impl GitHubFlavored {
    pub const NAME: &'static str = "github-flavored";
}

impl Plugin for GitHubFlavored {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn rules(&self) -> Vec<Box<dyn Rule>> {
        vec![
            Box::new(TableRule),
            Box::new(StrikethroughRule),
            Box::new(TaskListRule),
        ]
    }
}

struct StrikethroughRule;

impl Rule for StrikethroughRule {
    fn tags(&self) -> &'static [&'static str] {
        &["del", "s", "strike"]
    }

    fn render(&self, el: &Element<'_>, r: &mut Renderer<'_>) -> Result<RuleOutcome, ConversionError> {
        r.wrap_inline(el, "~~")?;
        Ok(RuleOutcome::Rendered)
    }
}

struct TaskListRule;

impl Rule for TaskListRule {
    fn tags(&self) -> &'static [&'static str] {
        &["input"]
    }

    fn render(&self, el: &Element<'_>, r: &mut Renderer<'_>) -> Result<RuleOutcome, ConversionError> {
        let is_checkbox = el
            .attr("type")
            .is_some_and(|kind| kind.trim().eq_ignore_ascii_case("checkbox"));
        if !is_checkbox {
            return Ok(RuleOutcome::Declined);
        }

        r.push_space();
        r.push_str(if el.has_attr("checked") { "[x] " } else { "[ ] " });
        Ok(RuleOutcome::Rendered)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

impl Alignment {
    fn of(cell: &Element<'_>) -> Self {
        let declared = cell.attr("align").or_else(|| {
            cell.attr("style").and_then(|style| {
                style.split(';').find_map(|decl| {
                    let (property, value) = decl.split_once(':')?;
                    property
                        .trim()
                        .eq_ignore_ascii_case("text-align")
                        .then(|| value.trim().to_string())
                })
            })
        });

        match declared.map(|value| value.to_ascii_lowercase()).as_deref() {
            Some("left") => Alignment::Left,
            Some("center") => Alignment::Center,
            Some("right") => Alignment::Right,
            _ => Alignment::None,
        }
    }

    fn delimiter(self) -> &'static str {
        match self {
            Alignment::None => "---",
            Alignment::Left => ":---",
            Alignment::Center => ":---:",
            Alignment::Right => "---:",
        }
    }
}

#[derive(Debug, Default)]
struct Row {
    cells: Vec<String>,
    alignments: Vec<Alignment>,
}

/// `<table>` as a pipe table
///
/// The header is the first `<thead>` row, or the first row when there is no
/// `<thead>`. Rows shorter than the widest one are padded with empty cells.
struct TableRule;

impl Rule for TableRule {
    fn tags(&self) -> &'static [&'static str] {
        &["table"]
    }

    fn render(&self, el: &Element<'_>, r: &mut Renderer<'_>) -> Result<RuleOutcome, ConversionError> {
        let mut caption = String::new();
        let mut head: Vec<Row> = Vec::new();
        let mut body: Vec<Row> = Vec::new();

        for child in el.children() {
            let Some(section) = Element::new(&child, el.depth() + 1) else {
                continue;
            };
            match section.tag() {
                "caption" => {
                    let text = r.capture(|r| r.render_children(&section))?;
                    caption = text.split_whitespace().collect::<Vec<_>>().join(" ");
                }
                "thead" => collect_rows(&section, r, &mut head)?,
                "tbody" | "tfoot" => collect_rows(&section, r, &mut body)?,
                "tr" => body.push(table_row(&section, r)?),
                _ => {}
            }
        }

        let mut rows = head.into_iter().chain(body);
        let Some(header) = rows.next() else {
            if !caption.is_empty() {
                r.start_block();
                r.push_str(&caption);
                r.end_block();
            }
            return Ok(RuleOutcome::Rendered);
        };
        let rest: Vec<Row> = rows.collect();

        let columns = rest
            .iter()
            .map(|row| row.cells.len())
            .chain(std::iter::once(header.cells.len()))
            .max()
            .unwrap_or(0)
            .max(1);

        let mut lines = Vec::with_capacity(rest.len() + 2);
        lines.push(format_row(&header.cells, columns));
        lines.push(separator(&header.alignments, columns));
        lines.extend(rest.iter().map(|row| format_row(&row.cells, columns)));

        r.start_block();
        if !caption.is_empty() {
            r.push_str(&caption);
            r.push_str("\n\n");
        }
        r.push_str(&lines.join("\n"));
        r.end_block();
        Ok(RuleOutcome::Rendered)
    }
}

fn collect_rows(
    section: &Element<'_>,
    r: &mut Renderer<'_>,
    rows: &mut Vec<Row>,
) -> Result<(), ConversionError> {
    r.engine().security().validate_depth(section.depth())?;
    for child in section.children() {
        if let Some(tr) = Element::new(&child, section.depth() + 1)
            && tr.tag() == "tr"
        {
            rows.push(table_row(&tr, r)?);
        }
    }
    Ok(())
}

fn table_row(tr: &Element<'_>, r: &mut Renderer<'_>) -> Result<Row, ConversionError> {
    r.engine().security().validate_depth(tr.depth())?;
    let mut row = Row::default();

    for child in tr.children() {
        let Some(cell) = Element::new(&child, tr.depth() + 1) else {
            continue;
        };
        if !matches!(cell.tag(), "td" | "th") {
            continue;
        }

        let content = r.capture(|r| r.render_children(&cell))?;
        row.cells.push(cell_text(&content));
        let alignment = Alignment::of(&cell);
        row.alignments.push(alignment);

        let span = cell
            .attr("colspan")
            .and_then(|span| span.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .clamp(1, MAX_COLSPAN);
        for _ in 1..span {
            row.cells.push(String::new());
            row.alignments.push(alignment);
        }
    }

    Ok(row)
}

/// Single-line cell content with pipes escaped
fn cell_text(content: &str) -> String {
    content
        .trim()
        .replace(['\n', '\r'], " ")
        .replace('|', "\\|")
}

fn format_row(cells: &[String], columns: usize) -> String {
    let mut line = String::from("|");
    for index in 0..columns {
        match cells.get(index).map(String::as_str) {
            Some(cell) if !cell.is_empty() => {
                line.push(' ');
                line.push_str(cell);
                line.push_str(" |");
            }
            _ => line.push_str(" |"),
        }
    }
    line
}

fn separator(alignments: &[Alignment], columns: usize) -> String {
    let mut line = String::from("|");
    for index in 0..columns {
        let alignment = alignments.get(index).copied().unwrap_or_default();
        line.push(' ');
        line.push_str(alignment.delimiter());
        line.push_str(" |");
    }
    line
}
