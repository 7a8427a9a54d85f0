use anyhow::{Context, Result, ensure};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse comma-separated seed arguments into numeric seeds.
pub fn parse_seeds(arg: &str) -> Result<Vec<u64>> {
    let seeds = split_csv(arg)
        .iter()
        .map(|token| {
            token
                .parse::<u64>()
                .with_context(|| format!("invalid seed {token:?}"))
        })
        .collect::<Result<Vec<_>>>()?;
    ensure!(!seeds.is_empty(), "at least one seed is required");
    Ok(seeds)
}
