//! Client for the skills.sh directory: JSON search plus scraping of the
//! featured list and per-skill detail pages.

use std::{sync::LazyLock, time::Duration};

use {
    regex::Regex,
    serde::{Deserialize, Serialize},
    skillknife_config::{Market, SearchConfig},
    skillknife_skills::MarketSkill,
    tracing::debug,
};

use crate::error::{Error, Result};

/// Upper bound on entries scraped from the featured page.
pub const FEATURED_LIMIT: usize = 50;

/// Detail descriptions longer than this many characters are cut.
pub const DESCRIPTION_LIMIT: usize = 500;

#[allow(clippy::expect_used)]
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<a[^>]+href="([^"]+)"[^>]*>(.*?)</a>"#).expect("valid link regex")
});
#[allow(clippy::expect_used)]
static INSTALLS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">([\d.]+[KkMm]?)<").expect("valid installs regex"));
#[allow(clippy::expect_used)]
static INSTALL_CMD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"npx skills add\s+([^<]+)").expect("valid command regex"));
#[allow(clippy::expect_used)]
static PROSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="prose[^"]*">(.*?)</div>"#).expect("valid prose regex")
});
#[allow(clippy::expect_used)]
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// One skill as listed by the search API or the featured page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub installs: u64,
    /// `owner/repo` hosting the skill.
    pub top_source: String,
}

impl SearchResult {
    pub fn into_market_skill(self) -> MarketSkill {
        MarketSkill {
            name: self.name,
            description: None,
            market: Market::global_search(),
            repo_path: self.top_source,
            subpath: self.id,
            content_hash: None,
            installs: Some(self.installs),
            install_command: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    skills: Vec<SearchResult>,
}

/// Fields scraped from a skill's detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillDetails {
    pub description: Option<String>,
    pub install_command: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SkillsShClient {
    http: reqwest::Client,
    base_url: String,
    limit: u32,
}

impl SkillsShClient {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            limit: config.limit,
        })
    }

    /// Query the search API. A blank query returns nothing without a request.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/api/search", self.base_url);
        let limit = self.limit.to_string();
        let resp = self
            .http
            .get(&url)
            .query(&[("q", query), ("limit", limit.as_str())])
            .send()
            .await?;
        let body = Self::success_body(resp, &url).await?;
        let parsed: SearchResponse = serde_json::from_str(&body)?;
        debug!(query, count = parsed.skills.len(), "skills.sh search");
        Ok(parsed.skills)
    }

    /// Scrape the landing page for its featured skill cards.
    pub async fn featured(&self) -> Result<Vec<SearchResult>> {
        let resp = self.http.get(&self.base_url).send().await?;
        let body = Self::success_body(resp, &self.base_url).await?;
        Ok(parse_featured_html(&body))
    }

    /// Scrape `<base>/<repo_path>/<name>` for a description and install command.
    pub async fn details(&self, repo_path: &str, name: &str) -> Result<SkillDetails> {
        let url = format!("{}/{}/{}", self.base_url, repo_path.trim_matches('/'), name);
        let resp = self.http.get(&url).send().await?;
        let body = Self::success_body(resp, &url).await?;
        Ok(parse_detail_html(&body))
    }

    async fn success_body(resp: reqwest::Response, url: &str) -> Result<String> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp.text().await?)
    }
}

/// Decode counters like `42`, `9.2K` or `1.5M`, truncating fractions.
pub fn parse_installs(raw: &str) -> Option<u64> {
    let raw = raw.trim().to_ascii_uppercase();
    let (number, multiplier) = match raw.as_bytes().last()? {
        b'K' => (&raw[..raw.len() - 1], 1_000.0),
        b'M' => (&raw[..raw.len() - 1], 1_000_000.0),
        _ => (raw.as_str(), 1.0),
    };
    let value: f64 = number.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    // Nudge past representation error so 4.35K lands on 4350.
    Some((value * multiplier + 1e-6).floor() as u64)
}

/// Extract skill cards from the landing page HTML.
///
/// A card is any anchor whose `href` is an absolute path of exactly three
/// segments, `/owner/repo/skill`. The install counter is the last
/// `>123<`-style token inside the anchor.
pub fn parse_featured_html(html: &str) -> Vec<SearchResult> {
    LINK_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let href = caps.get(1)?.as_str();
            let inner = caps.get(2)?.as_str();
            if !href.starts_with('/') {
                return None;
            }
            let segments: Vec<&str> = href.split('/').filter(|s| !s.is_empty()).collect();
            let [owner, repo, name] = segments.as_slice() else {
                return None;
            };
            let installs = INSTALLS_RE
                .captures_iter(inner)
                .last()
                .and_then(|c| parse_installs(c.get(1)?.as_str()))
                .unwrap_or(0);
            Some(SearchResult {
                id: (*name).to_string(),
                name: (*name).to_string(),
                installs,
                top_source: format!("{owner}/{repo}"),
            })
        })
        .take(FEATURED_LIMIT)
        .collect()
}

/// Extract the install command and prose description from a detail page.
pub fn parse_detail_html(html: &str) -> SkillDetails {
    let install_command = INSTALL_CMD_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| format!("npx skills add {}", m.as_str().trim_end()));

    let description = PROSE_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| TAG_RE.replace_all(m.as_str(), "").trim().to_string())
        .filter(|d| !d.is_empty())
        .map(|d| truncate_chars(&d, DESCRIPTION_LIMIT));

    SkillDetails {
        description,
        install_command,
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, mockito::Matcher};

    fn client(base_url: &str) -> SkillsShClient {
        SkillsShClient::new(&SearchConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn installs_parsing() {
        assert_eq!(parse_installs("9.2K"), Some(9_200));
        assert_eq!(parse_installs("1.5M"), Some(1_500_000));
        assert_eq!(parse_installs("42"), Some(42));
        assert_eq!(parse_installs("4.35k"), Some(4_350));
        assert_eq!(parse_installs("K"), None);
        assert_eq!(parse_installs(""), None);
    }

    #[test]
    fn featured_cards_from_three_segment_links() {
        let html = r#"
            <nav><a href="/docs">Docs</a><a href="https://x.com/a/b/c">ext</a></nav>
            <a class="card" href="/vercel-labs/agent-skills/react-best-practices">
              <span>react-best-practices</span><span>vercel-labs/agent-skills</span><span>9.2K</span>
            </a>
            <a href="/anthropics/skills/pdf"><div>pdf</div><span>1.5M</span></a>
            <a href="/a/b/c/d">too deep</a>
            <a href="/obra/superpowers/brainstorming">no counter</a>
        "#;
        let results = parse_featured_html(html);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].top_source, "vercel-labs/agent-skills");
        assert_eq!(results[0].name, "react-best-practices");
        assert_eq!(results[0].installs, 9_200);
        assert_eq!(results[1].installs, 1_500_000);
        assert_eq!(results[2].installs, 0);
    }

    #[test]
    fn featured_is_capped() {
        let html: String = (0..80)
            .map(|i| format!(r#"<a href="/o/r/s{i}"><span>{i}</span></a>"#))
            .collect();
        assert_eq!(parse_featured_html(&html).len(), FEATURED_LIMIT);
    }

    #[test]
    fn detail_page_extraction() {
        let html = r#"
            <code>npx skills add https://github.com/anthropics/skills --skill pdf</code>
            <div class="prose prose-invert"><p>Work with <b>PDF</b> files.</p></div>
        "#;
        let details = parse_detail_html(html);
        assert_eq!(
            details.install_command.as_deref(),
            Some("npx skills add https://github.com/anthropics/skills --skill pdf")
        );
        assert_eq!(details.description.as_deref(), Some("Work with PDF files."));
    }

    #[test]
    fn long_descriptions_are_truncated() {
        let body = "é".repeat(600);
        let html = format!(r#"<div class="prose">{body}</div>"#);
        let description = parse_detail_html(&html).description.unwrap();
        assert_eq!(description.chars().count(), DESCRIPTION_LIMIT + 3);
        assert!(description.ends_with("..."));
        assert_eq!(parse_detail_html("<html></html>"), SkillDetails::default());
    }

    #[tokio::test]
    async fn search_hits_api_with_query_and_limit() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "pdf".into()),
                Matcher::UrlEncoded("limit".into(), "50".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "skills": [
                        {"id": "pdf", "name": "pdf", "installs": 1200, "topSource": "anthropics/skills"}
                    ],
                    "count": 1
                })
                .to_string(),
            )
            .create_async()
            .await;

        let results = client(&server.url()).search("  pdf ").await.unwrap();
        assert_eq!(results.len(), 1);
        let skill = results[0].clone().into_market_skill();
        assert_eq!(skill.repo_path, "anthropics/skills");
        assert_eq!(skill.installs, Some(1200));
        assert!(skill.market.is_search());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn blank_query_skips_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/search")
            .expect(0)
            .create_async()
            .await;
        assert!(client(&server.url()).search("   ").await.unwrap().is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn search_failure_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/search")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;
        let err = client(&server.url()).search("pdf").await.unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn details_fetches_skill_page() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/anthropics/skills/pdf")
            .with_status(200)
            .with_body(r#"<div class="prose">PDF tools</div>"#)
            .create_async()
            .await;
        let details = client(&server.url())
            .details("anthropics/skills", "pdf")
            .await
            .unwrap();
        assert_eq!(details.description.as_deref(), Some("PDF tools"));
        assert!(details.install_command.is_none());
    }
}
