//! Utility functions for CLI commands.

/// Prints a result as JSON or YAML.
pub fn output_result<T: serde::Serialize>(result: &T, as_json: bool) -> anyhow::Result<()> {
    let output = if as_json {
        serde_json::to_string_pretty(result)? + "\n"
    } else {
        serde_yaml::to_string(result)?
    };
    print!("{}", output);
    Ok(())
}
