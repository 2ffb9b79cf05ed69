//! `--range col=min:max[,min:max]` and `--allow col=a,b` arguments.

use anyhow::{anyhow, Context, Result};
use ogd_dataset::{Dataset, Filter, NumericRange};

fn split_assignment(arg: &str) -> Result<(&str, &str)> {
    let (column, rest) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected `column=...`, got `{arg}`"))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(anyhow!("missing column name in `{arg}`"));
    }
    Ok((column, rest))
}

pub fn parse_range_arg(arg: &str) -> Result<(String, Filter)> {
    let (column, spec) = split_assignment(arg)?;
    let mut ranges = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (min, max) = part
            .split_once(':')
            .ok_or_else(|| anyhow!("expected `min:max`, got `{part}`"))?;
        let min: f64 = min
            .trim()
            .parse()
            .with_context(|| format!("bad lower bound in `{part}`"))?;
        let max: f64 = max
            .trim()
            .parse()
            .with_context(|| format!("bad upper bound in `{part}`"))?;
        ranges.push(NumericRange::new(min, max));
    }
    Ok((column.to_string(), Filter::ranges(ranges)))
}

pub fn parse_allow_arg(arg: &str) -> Result<(String, Filter)> {
    let (column, spec) = split_assignment(arg)?;
    let values: Vec<&str> = spec.split(',').map(str::trim).collect();
    Ok((column.to_string(), Filter::allow(values)))
}

/// Parse and install every filter argument; later arguments on the same
/// column replace earlier ones.
pub fn apply_filter_args(
    dataset: &mut Dataset,
    ranges: &[String],
    allows: &[String],
) -> Result<()> {
    let parsed = ranges
        .iter()
        .map(|a| parse_range_arg(a))
        .chain(allows.iter().map(|a| parse_allow_arg(a)));
    for item in parsed {
        let (column, filter) = item?;
        dataset
            .set_filter(&column, filter)
            .with_context(|| format!("cannot filter on `{column}`"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ogd_dataset::Value;

    #[test]
    fn parses_multi_range() {
        let (column, filter) = parse_range_arg("level=0:3, 7.5:10").unwrap();
        assert_eq!(column, "level");
        assert_eq!(
            filter,
            Filter::ranges([NumericRange::new(0.0, 3.0), NumericRange::new(7.5, 10.0)])
        );
        assert!(filter.matches(Some(&Value::Number(8.0))));
        assert!(!filter.matches(Some(&Value::Number(5.0))));
    }

    #[test]
    fn parses_allow_list() {
        let (column, filter) = parse_allow_arg("class=A, B").unwrap();
        assert_eq!(column, "class");
        assert_eq!(filter, Filter::allow(["A", "B"]));
    }

    #[test]
    fn rejects_malformed_arguments() {
        assert!(parse_range_arg("level").is_err());
        assert!(parse_range_arg("=1:2").is_err());
        assert!(parse_range_arg("level=1-2").is_err());
        assert!(parse_range_arg("level=a:2").is_err());
        assert!(parse_allow_arg("class").is_err());
    }
}
