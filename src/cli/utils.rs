//! Convenience helpers shared across command handlers.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tombola::GenerationBatch;
use tombola::core::MAX_NUMBER;

/// Persist a string either to a file or stdout when `-` is provided.
pub fn write_output(path: &Path, content: &str) -> Result<()> {
    if path.as_os_str() == "-" {
        io::stdout().write_all(content.as_bytes())?;
        return Ok(());
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

/// Load a card batch file, attaching path context to any error.
pub fn load_batch(path: &Path) -> Result<GenerationBatch> {
    GenerationBatch::load(path)
        .with_context(|| format!("failed to read card batch {}", path.display()))
}

/// Seeded RNG when `--seed` is given, fresh entropy otherwise.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Parse a list of drawn numbers such as `4, 17,33 61`.
pub fn parse_number_list(input: &str) -> Result<Vec<u8>> {
    let mut numbers = Vec::new();
    for token in input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        let value: u8 = token
            .parse()
            .map_err(|_| anyhow!("'{}' is not a bingo number", token))?;
        if value == 0 || value > MAX_NUMBER {
            return Err(anyhow!("{} is outside 1..={}", value, MAX_NUMBER));
        }
        if !numbers.contains(&value) {
            numbers.push(value);
        }
    }
    Ok(numbers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_separators_and_drops_repeats() {
        assert_eq!(parse_number_list("4, 17,33 61 4").unwrap(), vec![4, 17, 33, 61]);
        assert!(parse_number_list("0").is_err());
        assert!(parse_number_list("76").is_err());
        assert!(parse_number_list("seven").is_err());
        assert!(parse_number_list("").unwrap().is_empty());
    }
}
