use serde::Serialize;
use serde_json::Value;
use tickwatch_core::{FavoriteEntry, FavoritesSynchronizer, NewFavorite, Symbol};
use tracing::warn;

use crate::cli::{AddFavoriteArgs, FavoritesCommand};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct ListResponseData<'a> {
    favorites: &'a [FavoriteEntry],
    /// `"remote"`, or `"local_cache"` when the remote could not be reached.
    source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

#[derive(Debug, Serialize)]
struct AddResponseData {
    favorite: FavoriteEntry,
}

#[derive(Debug, Serialize)]
struct RemoveResponseData {
    symbol: Symbol,
    removed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckResponseData {
    symbol: Symbol,
    is_favorite: bool,
}

pub async fn run(
    command: &FavoritesCommand,
    favorites: &FavoritesSynchronizer,
) -> Result<Value, CliError> {
    match command {
        FavoritesCommand::List => list(favorites).await,
        FavoritesCommand::Add(args) => add(args, favorites).await,
        FavoritesCommand::Remove(args) => remove(&args.symbol, favorites).await,
        FavoritesCommand::Check(args) => {
            let symbol = Symbol::parse(&args.symbol).map_err(tickwatch_core::ClientError::from)?;
            let is_favorite = favorites.check_remote(symbol.as_str()).await?;
            Ok(serde_json::to_value(CheckResponseData { symbol, is_favorite })?)
        }
    }
}

async fn list(favorites: &FavoritesSynchronizer) -> Result<Value, CliError> {
    match favorites.load().await {
        Ok(collection) => Ok(serde_json::to_value(ListResponseData {
            favorites: collection.as_slice(),
            source: "remote",
            warning: None,
        })?),
        Err(error) => {
            let snapshot = favorites.snapshot();
            if snapshot.entries.is_empty() {
                return Err(error.into());
            }
            Ok(serde_json::to_value(ListResponseData {
                favorites: snapshot.entries.as_slice(),
                source: "local_cache",
                warning: Some(error.to_string()),
            })?)
        }
    }
}

async fn add(args: &AddFavoriteArgs, favorites: &FavoritesSynchronizer) -> Result<Value, CliError> {
    let mut favorite = NewFavorite::new(args.symbol.as_str());
    if let Some(name) = &args.name {
        favorite = favorite.with_name(name.as_str());
    }
    if let Some(price) = args.price {
        favorite = favorite.with_price(price);
    }

    let favorite = favorites.add(favorite).await?;
    Ok(serde_json::to_value(AddResponseData { favorite })?)
}

/// Loads first so the symbol is known locally; an unreachable remote is
/// reported by the removal itself.
async fn remove(symbol: &str, favorites: &FavoritesSynchronizer) -> Result<Value, CliError> {
    let symbol = Symbol::parse(symbol).map_err(tickwatch_core::ClientError::from)?;
    if let Err(error) = favorites.load().await {
        warn!(error = %error, "could not refresh favorites before removal");
    }

    let removed = favorites.is_favorite(symbol.as_str());
    favorites.remove(symbol.as_str()).await?;
    Ok(serde_json::to_value(RemoveResponseData { symbol, removed })?)
}
