//! Human-readable renderings of a run's briefing: console/plain text and HTML.

use crate::domain::headline::ScoredHeadline;
use crate::domain::prediction::{format_quote, DirectionCall, MarketQuotes};
use chrono::NaiveDate;
use std::fmt;

const FOOTER_BRAND: &str = "Generated by the pre-open briefing bot";

#[derive(Debug, Clone)]
pub struct Briefing {
    pub date: NaiveDate,
    pub quotes: MarketQuotes,
    pub news: Vec<ScoredHeadline>,
    pub direction: DirectionCall,
    pub move_msg: String,
    /// Footer timestamp, already formatted (e.g. "08:15 AM ET").
    pub generated_at: String,
}

impl Briefing {
    pub fn title(&self) -> String {
        format!("📊 Pre-Market Alert for {}", self.date)
    }

    /// Headline lines joined the way the prediction log stores them.
    pub fn news_column(&self) -> String {
        self.news
            .iter()
            .map(ScoredHeadline::display_line)
            .collect::<Vec<_>>()
            .join(" | ")
    }

    pub fn render_text(&self) -> String {
        self.to_string()
    }

    pub fn render_html(&self) -> String {
        let items: String = self
            .news
            .iter()
            .map(|n| format!("<li>{}</li>", escape_html(&n.display_line())))
            .collect();

        format!(
            r#"<html>
<body style="font-family: Arial, sans-serif; padding: 20px; color: #333;">
  <h2 style="color: #0d6efd;">{title}</h2>
  <p>
    <strong>🔹 SPX:</strong> {spx} &nbsp;&nbsp;
    <strong>🔺 VIX:</strong> {vix} &nbsp;&nbsp;
    <strong>📉 ES:</strong> {es}
  </p>
  <h3>📰 Headlines:</h3>
  <ul>{items}</ul>
  <h3>📊 Market Bias: {bias}</h3>
  <br>
  <p style="font-size: 0.9em; color: #888;">{brand} • {generated_at}</p>
</body>
</html>
"#,
            title = escape_html(&self.title()),
            spx = format_quote(self.quotes.spx),
            vix = format_quote(self.quotes.vix),
            es = format_quote(self.quotes.es),
            items = items,
            bias = escape_html(&self.direction.label()),
            brand = FOOTER_BRAND,
            generated_at = escape_html(&self.generated_at),
        )
    }
}

/// Console rendering of the briefing.
impl fmt::Display for Briefing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title())?;
        writeln!(
            f,
            "🔹 SPX: {}  🔺 VIX: {}  📉 ES: {}\n",
            format_quote(self.quotes.spx),
            format_quote(self.quotes.vix),
            format_quote(self.quotes.es)
        )?;

        writeln!(f, "📰 Headlines:")?;
        if self.news.is_empty() {
            writeln!(f, "- (no relevant headlines)")?;
        }
        for n in &self.news {
            writeln!(f, "- {}", n.display_line())?;
        }

        writeln!(f, "\n📊 Market Bias: {}", self.direction.label())?;
        for r in &self.direction.reasons {
            writeln!(f, "- {r}")?;
        }

        writeln!(f, "\n📉 Expected Move: {}", self.move_msg)?;
        writeln!(f, "{FOOTER_BRAND} • {}", self.generated_at)
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
