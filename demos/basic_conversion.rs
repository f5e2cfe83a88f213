//! Basic conversions through the adapter
//!
//! Run with: cargo run --example basic_conversion

use html_md_converter::{ConversionError, Converter, EngineConfig};

const SAMPLES: &[(&str, &str)] = &[
    (
        "Heading and paragraph",
        "<h1>Welcome</h1><p>This is a <strong>test</strong> document.</p>",
    ),
    (
        "GitHub-flavored table",
        "<table><tr><th>Feature</th><th align=\"right\">Status</th></tr><tr><td>Tables</td><td>done</td></tr></table>",
    ),
    (
        "Strikethrough and task list",
        "<ul><li><input type=\"checkbox\" checked> <del>write</del> ship</li><li><input type=\"checkbox\"> test</li></ul>",
    ),
    (
        "Code block containing a fence",
        "<pre><code class=\"language-markdown\">```\nnested\n```</code></pre>",
    ),
    (
        "Malformed markup",
        "<p><strong>unclosed <em>tags<div>and a stray</p></span>",
    ),
    (
        "Script removal",
        "<p>Safe</p><script>alert('xss')</script><a href=\"javascript:void(0)\">click</a>",
    ),
];

fn main() -> Result<(), ConversionError> {
    let converter = Converter::new();
    println!("Plugins: {}\n", converter.plugins().join(", "));

    for (title, html) in SAMPLES {
        println!("=== {title} ===");
        println!("{html}\n");
        println!("{}\n", converter.convert(html)?);
    }

    let with_base = Converter::with_config(EngineConfig {
        base_url: Some("https://example.com/docs/".to_string()),
        ..EngineConfig::default()
    });
    println!("=== Relative links with a base URL ===");
    println!(
        "{}",
        with_base.convert("<p>See <a href=\"intro.html\">the intro</a> and <img src=\"/logo.png\" alt=\"logo\">.</p>")?
    );

    Ok(())
}
