use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use refscope_core::Reference;

use super::{Candidate, USER_AGENT, VerificationSource, check_status};

const API_URL: &str = "https://api.semanticscholar.org/graph/v1/paper/search";
const FIELDS: &str = "title,authors,year,externalIds";

pub struct SemanticScholar {
    pub api_key: Option<String>,
}

/// Convert the `data` array of a paper search response into candidates.
pub fn parse_papers(data: &serde_json::Value) -> Vec<Candidate> {
    let Some(papers) = data["data"].as_array() else {
        return Vec::new();
    };

    papers
        .iter()
        .map(|paper| Candidate {
            title: paper["title"].as_str().unwrap_or("").to_string(),
            authors: paper["authors"]
                .as_array()
                .map(|arr| {
                    arr.iter()
                        .filter_map(|a| a["name"].as_str())
                        .filter(|name| !name.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            year: paper["year"].as_i64().and_then(|y| i32::try_from(y).ok()),
            doi: paper["externalIds"]["DOI"].as_str().map(String::from),
            abstract_text: None,
        })
        .collect()
}

impl VerificationSource for SemanticScholar {
    fn name(&self) -> &str {
        "semantic_scholar"
    }

    fn search<'a>(
        &'a self,
        reference: &'a Reference,
        client: &'a reqwest::Client,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Candidate>, String>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!(
                "{}?query={}&fields={}&limit=3",
                API_URL,
                urlencoding::encode(&reference.title),
                FIELDS
            );

            let mut req = client
                .get(&url)
                .header("User-Agent", USER_AGENT)
                .timeout(timeout);

            if let Some(ref key) = self.api_key {
                req = req.header("x-api-key", key);
            }

            let resp = req.send().await.map_err(|e| e.to_string())?;
            check_status(&resp)?;

            let data: serde_json::Value = resp.json().await.map_err(|e| e.to_string())?;
            Ok(parse_papers(&data))
        })
    }
}
