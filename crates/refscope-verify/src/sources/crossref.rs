use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use refscope_core::Reference;

use super::{Candidate, USER_AGENT, VerificationSource, check_status};

const API_URL: &str = "https://api.crossref.org/works";

pub struct CrossRef {
    pub mailto: Option<String>,
}

impl CrossRef {
    fn request_url(&self, reference: &Reference) -> String {
        let mut url = format!(
            "{}?query.bibliographic={}&rows=3",
            API_URL,
            urlencoding::encode(&reference.title)
        );
        if let Some(author) = reference.authors.first() {
            url.push_str(&format!("&query.author={}", urlencoding::encode(author)));
        }
        if let Some(ref email) = self.mailto {
            url.push_str(&format!("&mailto={}", urlencoding::encode(email)));
        }
        url
    }

    fn user_agent(&self) -> String {
        match self.mailto {
            Some(ref email) => format!("{} (mailto:{})", USER_AGENT, email),
            None => USER_AGENT.to_string(),
        }
    }
}

/// Remove JATS markup (`<jats:p>` and friends) from a CrossRef abstract.
pub fn strip_jats(text: &str) -> String {
    static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
    TAG.replace_all(text, "").trim().to_string()
}

/// Convert the `message.items` of a works response into candidates.
pub fn parse_items(data: &serde_json::Value) -> Vec<Candidate> {
    let Some(items) = data["message"]["items"].as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .map(|item| {
            let title = item["title"]
                .as_array()
                .and_then(|a| a.first())
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();

            let authors = item["author"]
                .as_array()
                .map(|arr| {
                    arr.iter()
                        .map(|a| {
                            let given = a["given"].as_str().unwrap_or("");
                            let family = a["family"].as_str().unwrap_or("");
                            format!("{} {}", given, family).trim().to_string()
                        })
                        .filter(|name| !name.is_empty())
                        .collect()
                })
                .unwrap_or_default();

            let year = item["published"]["date-parts"][0][0]
                .as_i64()
                .and_then(|y| i32::try_from(y).ok());

            let abstract_text = item["abstract"]
                .as_str()
                .map(strip_jats)
                .filter(|a| !a.is_empty());

            Candidate {
                title,
                authors,
                year,
                doi: item["DOI"].as_str().map(String::from),
                abstract_text,
            }
        })
        .collect()
}

impl VerificationSource for CrossRef {
    fn name(&self) -> &str {
        "crossref"
    }

    fn search<'a>(
        &'a self,
        reference: &'a Reference,
        client: &'a reqwest::Client,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Candidate>, String>> + Send + 'a>> {
        Box::pin(async move {
            let resp = client
                .get(self.request_url(reference))
                .header("User-Agent", self.user_agent())
                .timeout(timeout)
                .send()
                .await
                .map_err(|e| e.to_string())?;
            check_status(&resp)?;

            let data: serde_json::Value = resp.json().await.map_err(|e| e.to_string())?;
            Ok(parse_items(&data))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reference() -> Reference {
        Reference {
            id: "ref_01".into(),
            authors: vec!["Smith, J.".into(), "Doe, A.".into()],
            title: "Machine learning & healthcare".into(),
            year: Some(2020),
            journal: None,
            volume: None,
            pages: None,
            doi: None,
            raw_text: String::new(),
        }
    }

    #[test]
    fn test_request_url() {
        let source = CrossRef {
            mailto: Some("me@example.org".into()),
        };
        let url = source.request_url(&reference());
        assert_eq!(
            url,
            "https://api.crossref.org/works?query.bibliographic=Machine%20learning%20%26%20healthcare\
             &rows=3&query.author=Smith%2C%20J.&mailto=me%40example.org"
        );
        assert!(source.user_agent().ends_with("(mailto:me@example.org)"));
    }

    #[test]
    fn test_request_url_without_authors() {
        let mut r = reference();
        r.authors.clear();
        let url = CrossRef { mailto: None }.request_url(&r);
        assert!(!url.contains("query.author"));
        assert!(!url.contains("mailto"));
    }

    #[test]
    fn test_parse_items() {
        let data = json!({
            "message": {
                "items": [{
                    "DOI": "10.1038/s41591-020-0803-x",
                    "title": ["Machine learning in healthcare"],
                    "author": [
                        {"given": "Jane", "family": "Smith"},
                        {"family": "Consortium"},
                    ],
                    "published": {"date-parts": [[2020, 3]]},
                    "abstract": "<jats:p>We review <jats:italic>ML</jats:italic>.</jats:p>",
                }, {
                    "title": [],
                }]
            }
        });
        let items = parse_items(&data);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Machine learning in healthcare");
        assert_eq!(items[0].authors, vec!["Jane Smith", "Consortium"]);
        assert_eq!(items[0].year, Some(2020));
        assert_eq!(items[0].doi.as_deref(), Some("10.1038/s41591-020-0803-x"));
        assert_eq!(items[0].abstract_text.as_deref(), Some("We review ML."));
        assert_eq!(items[1], Candidate::default());
    }

    #[test]
    fn test_parse_items_missing_message() {
        assert!(parse_items(&json!({"status": "error"})).is_empty());
    }
}
