//! Web query through the DuckDuckGo Instant Answer API.
//!
//! No API key is needed. The API returns abstracts, instant answers,
//! definitions and related topics rather than full result listings.

use council_application::ports::lookup_backend::BackendError;
use std::time::Duration;

const DDG_API_URL: &str = "https://api.duckduckgo.com/";

/// Shared HTTP client for web queries
#[derive(Debug, Clone)]
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
}

impl DuckDuckGoSearch {
    pub fn new(timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("expert-council/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BackendError::Unavailable(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub async fn query(&self, query: &str, limit: usize) -> Result<String, BackendError> {
        if query.trim().is_empty() {
            return Err(BackendError::InvalidInput("empty web query".to_string()));
        }

        let response = self
            .client
            .get(DDG_API_URL)
            .query(&[("q", query), ("format", "json"), ("no_html", "1"), ("skip_disambig", "1")])
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(format!("search request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(BackendError::Unavailable(format!(
                "search API returned {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BackendError::Unavailable(format!("unreadable search response: {}", e)))?;

        Ok(format_results(query, &body, limit))
    }
}

fn non_empty<'a>(data: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    data[key].as_str().filter(|s| !s.is_empty())
}

/// Render the API response as markdown sections
fn format_results(query: &str, data: &serde_json::Value, limit: usize) -> String {
    let mut sections = vec![format!("## Web results for: {}", query)];

    if let Some(text) = non_empty(data, "AbstractText") {
        sections.push(format!(
            "### Summary ({})\n{}\nSource: {}",
            non_empty(data, "AbstractSource").unwrap_or("unknown"),
            text,
            data["AbstractURL"].as_str().unwrap_or("")
        ));
    }

    if let Some(answer) = non_empty(data, "Answer") {
        sections.push(format!("### Answer\n{}", answer));
    }

    if let Some(definition) = non_empty(data, "Definition") {
        sections.push(format!(
            "### Definition ({})\n{}",
            non_empty(data, "DefinitionSource").unwrap_or("unknown"),
            definition
        ));
    }

    // topic groups nest their entries under "Topics"
    let topics: Vec<String> = data["RelatedTopics"]
        .as_array()
        .into_iter()
        .flatten()
        .flat_map(|t| match t["Topics"].as_array() {
            Some(nested) => nested.iter().collect::<Vec<_>>(),
            None => vec![t],
        })
        .filter_map(|t| {
            let text = non_empty(t, "Text")?;
            Some(format!("- {} ({})", text, t["FirstURL"].as_str().unwrap_or("")))
        })
        .take(limit)
        .collect();
    if !topics.is_empty() {
        sections.push(format!("### Related\n{}", topics.join("\n")));
    }

    if sections.len() == 1 {
        sections.push("No instant answer available for this query.".to_string());
    }
    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_abstract_and_answer() {
        let data = json!({
            "AbstractText": "Rust is a systems programming language.",
            "AbstractSource": "Wikipedia",
            "AbstractURL": "https://en.wikipedia.org/wiki/Rust_(programming_language)",
            "Answer": "1.0 was released in 2015",
            "RelatedTopics": []
        });
        let output = format_results("rust", &data, 5);
        assert!(output.starts_with("## Web results for: rust"));
        let summary = "### Summary (Wikipedia)\nRust is a systems programming language.";
        assert!(output.contains(summary));
        assert!(output.contains("### Answer\n1.0 was released in 2015"));
    }

    #[test]
    fn test_related_topics_are_flattened_and_limited() {
        let data = json!({
            "RelatedTopics": [
                {"Text": "One", "FirstURL": "https://example.com/1"},
                {"Name": "Group", "Topics": [
                    {"Text": "Two", "FirstURL": "https://example.com/2"},
                    {"Text": "Three", "FirstURL": "https://example.com/3"}
                ]}
            ]
        });
        let output = format_results("q", &data, 2);
        assert!(output.contains("- One (https://example.com/1)\n- Two (https://example.com/2)"));
        assert!(!output.contains("Three"));
    }

    #[test]
    fn test_empty_response() {
        let data = json!({"AbstractText": "", "RelatedTopics": []});
        let output = format_results("obscure", &data, 5);
        assert!(output.ends_with("No instant answer available for this query."));
    }
}
