use crate::domain::headline::Headline;

/// Finance vocabulary; a headline is relevant if any term occurs in it.
pub const MARKET_KEYWORDS: &[&str] = &[
    "fed",
    "federal reserve",
    "interest rate",
    "tariff",
    "rate",
    "inflation",
    "disinflation",
    "deflation",
    "yields",
    "bond",
    "treasury",
    "quantitative tightening",
    "quantitative easing",
    "hawkish",
    "dovish",
    "fomc",
    "central bank",
    "earnings",
    "revenue",
    "guidance",
    "stocks",
    "markets",
    "indices",
    "s&p",
    "nasdaq",
    "dow",
    "volatility",
    "vix",
    "recession",
    "soft landing",
    "jobless",
    "unemployment",
    "nonfarm",
    "cpi",
    "ppi",
    "gdp",
    "retail sales",
    "housing",
    "consumer sentiment",
    "ism",
    "pce",
    "commodities",
    "oil prices",
    "energy prices",
    "geopolitical",
    "china",
    "opec",
    "rate hike",
    "rate cut",
    "ecb",
    "boe",
    "boj",
    "debt ceiling",
    "fiscal policy",
    "economic outlook",
    "layoffs",
    "banking crisis",
    "credit rating",
    "supply chain",
    "default",
    "liquidity",
    "volumes",
    "short selling",
    "options expiry",
    "earnings call",
];

pub fn is_market_relevant(text: &str) -> bool {
    let lower = text.to_lowercase();
    MARKET_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Keeps headlines whose rendered `"text - link"` line mentions a keyword, so
/// a section path such as `/markets/` in the link is enough on its own.
pub fn filter_relevant(headlines: Vec<Headline>) -> Vec<Headline> {
    headlines
        .into_iter()
        .filter(|h| is_market_relevant(&h.to_string()))
        .collect()
}
