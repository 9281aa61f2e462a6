// ABOUTME: Parser for the driver's command script.
// ABOUTME: One step per line; blank lines and # comments are skipped.

use anyhow::{bail, Context, Result};
use ft_core::PaneCommand;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Pane(PaneCommand),
    /// Key chord, resolved through the configured bindings
    Key(String),
    /// Show a document in the focused pane
    Open(String),
    Resize(u32, u32),
    Scroll(i32, i32),
    Click(u32, u32),
    Dump,
}

fn number<T: std::str::FromStr>(word: Option<&str>, what: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let word = word.with_context(|| format!("missing {what}"))?;
    word.parse()
        .with_context(|| format!("invalid {what}: {word:?}"))
}

/// Parse one script line. Returns None for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<Step>> {
    let line = line.split('#').next().unwrap_or_default().trim();
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    let step = match verb.to_ascii_lowercase().as_str() {
        "split" => match words.next().map(str::to_ascii_lowercase).as_deref() {
            Some("horizontal" | "h") => Step::Pane(PaneCommand::SplitHorizontal),
            Some("vertical" | "v") => Step::Pane(PaneCommand::SplitVertical),
            Some(other) => bail!("unknown split orientation {other:?}"),
            None => bail!("split needs an orientation"),
        },
        "close" => Step::Pane(PaneCommand::Close),
        "exchange" => Step::Pane(PaneCommand::Exchange),
        "key" => Step::Key(words.next().context("missing key chord")?.to_string()),
        "open" => Step::Open(words.next().context("missing document name")?.to_string()),
        "resize" => Step::Resize(
            number(words.next(), "width")?,
            number(words.next(), "height")?,
        ),
        "scroll" => Step::Scroll(number(words.next(), "dx")?, number(words.next(), "dy")?),
        "click" => Step::Click(number(words.next(), "x")?, number(words.next(), "y")?),
        "dump" => Step::Dump,
        other => bail!("unknown command {other:?}"),
    };

    if let Some(extra) = words.next() {
        bail!("unexpected argument {extra:?}");
    }
    Ok(Some(step))
}
