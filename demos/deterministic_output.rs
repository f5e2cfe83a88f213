//! Identical input gives byte-identical Markdown, from one converter or many
//!
//! Run with: cargo run --example deterministic_output

use html_md_converter::Converter;
use std::sync::Arc;
use std::thread;

const HTML: &str = r#"
<html>
<head><title>Test Page</title></head>
<body>
    <h1>Main Title</h1>
    <p>This is a paragraph with <strong>bold</strong> and <em>italic</em> text.</p>
    <p>Here's a <a href="https://example.com">link</a> and an image: <img src="image.png" alt="Test Image"/></p>
    <ul>
        <li>First item</li>
        <li>Second item with <code>inline code</code></li>
        <li>Third item
            <ul>
                <li>Nested item 1</li>
                <li>Nested item 2</li>
            </ul>
        </li>
    </ul>
    <pre><code class="language-rust">
fn main() {
    println!("Hello, world!");
}
    </code></pre>
    <table>
        <tr><th>Name</th><th>Value</th></tr>
        <tr><td>alpha</td><td><s>1</s> 2</td></tr>
    </table>
</body>
</html>
"#;

fn main() {
    let converter = Arc::new(Converter::new());
    let reference = match converter.convert(HTML) {
        Ok(markdown) => markdown,
        Err(err) => {
            eprintln!("conversion failed: {err}");
            std::process::exit(1);
        }
    };
    println!("{reference}\n");

    let repeated = (0..10).all(|_| converter.convert(HTML).is_ok_and(|m| m == reference));
    println!("10 repeated conversions identical: {repeated}");

    let fresh = Converter::new().convert(HTML).is_ok_and(|m| m == reference);
    println!("Separate instance identical: {fresh}");

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let converter = Arc::clone(&converter);
            thread::spawn(move || converter.convert(HTML).ok())
        })
        .collect();
    let threaded = workers
        .into_iter()
        .all(|w| w.join().ok().flatten().as_ref() == Some(&reference));
    println!("Concurrent conversions identical: {threaded}");
}
