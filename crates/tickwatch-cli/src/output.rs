use serde_json::Value;

use crate::error::CliError;

pub fn render(payload: &Value, pretty: bool) -> Result<(), CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(payload)?
    } else {
        serde_json::to_string(payload)?
    };
    println!("{payload}");
    Ok(())
}
