use serde::Serialize;
use serde_json::Value;
use tickwatch_core::{NormalizedStockRecord, StockDataCache};

use crate::cli::StockArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct StockResponseData {
    range_days: u32,
    cache_bypassed: bool,
    record: NormalizedStockRecord,
}

pub async fn run(args: &StockArgs, stocks: &StockDataCache) -> Result<Value, CliError> {
    let record = if args.refresh {
        stocks.refresh(&args.symbol, args.days).await?
    } else {
        stocks.fetch(&args.symbol, args.days, true).await?
    };

    Ok(serde_json::to_value(StockResponseData {
        range_days: args.days,
        cache_bypassed: args.refresh,
        record,
    })?)
}
