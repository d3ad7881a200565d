use std::fs;
use std::io::{self, Read};
use std::path::Path;

use log::info;

use crate::core::chain::FilterChain;
use crate::core::filter::Filter;
use crate::core::registry::FilterRegistry;
use crate::models::{ChainSpec, FilterError, Value};

/// Run a configured chain over a JSON value
///
/// # Arguments
/// * `chain_path` - Chain specification (JSON)
/// * `input` - JSON document holding the value; stdin when `None`
///
/// # Returns
/// * The filtered value as pretty-printed JSON
pub fn apply_chain(chain_path: &Path, input: Option<&Path>) -> Result<String, String> {
    let spec = ChainSpec::from_path(chain_path)?;
    let chain = FilterChain::from_spec(FilterRegistry::with_defaults(), &spec)?;
    info!("Loaded chain with {} filters from {}", chain.len(), chain_path.display());

    let raw = match input {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| format!("Failed to read input {}: {}", path.display(), e))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| format!("Failed to read stdin: {}", e))?;
            buffer
        }
    };

    let output = filter_json(&chain, &raw)?;
    Ok(output)
}

/// Parse, filter and re-serialize one JSON document
pub fn filter_json(filter: &dyn Filter, raw: &str) -> Result<String, FilterError> {
    let json: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| FilterError::InvalidArgument(format!("Input is not valid JSON: {}", e)))?;

    let filtered = filter.filter(Value::from(json))?;

    serde_json::to_string_pretty(&serde_json::Value::from(filtered))
        .map_err(|e| FilterError::Runtime(format!("Failed to serialize result: {}", e)))
}
