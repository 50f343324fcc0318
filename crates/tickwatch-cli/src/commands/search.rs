use serde::Serialize;
use serde_json::Value;
use tickwatch_core::{SearchDebouncer, SearchResult};

use crate::cli::SearchArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct SearchResponseData {
    query: String,
    results: Vec<SearchResult>,
}

/// One-shot search: there are no keystrokes to coalesce, so the quiet period
/// is skipped.
pub async fn run(args: &SearchArgs, search: &SearchDebouncer) -> Result<Value, CliError> {
    let query = args.keywords.trim().to_owned();
    let results = search.query(&query).await?;
    Ok(serde_json::to_value(SearchResponseData { query, results })?)
}
