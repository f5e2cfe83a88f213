//! Engine plugins
//!
//! - [`GitHubFlavored`]: pipe tables, `~~strikethrough~~`, task list checkboxes
//! - [`RobustCodeBlock`]: fenced code that survives backticks in the content,
//!   nested or malformed `<pre>`/`<code>`, highlighter markup and line-number
//!   gutters

mod github_flavored;
mod robust_code_block;

pub use github_flavored::GitHubFlavored;
pub use robust_code_block::RobustCodeBlock;
