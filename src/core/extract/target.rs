//! Parsing for "<path>[:<start>[-<end>]]" read targets with Windows support.

/// Malformed range suffix
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError
{
    #[error("missing file path in '{0}'")]
    MissingPath(String),

    #[error("invalid line number '{0}'")]
    InvalidNumber(String),

    #[error("line numbers must be >= 1: {0}")]
    Zero(String),

    #[error("start > end in range: {0}")]
    Reversed(String),
}

/// One file plus an optional inclusive 1-based line range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadTarget
{
    /// File path as provided.
    pub file: String,
    /// First line to show (`None` = 1).
    pub start: Option<usize>,
    /// Last line to show (`None` = end of file).
    pub end: Option<usize>,
}

impl ReadTarget
{
    /// Parse `src/m.f90`, `src/m.f90:10`, `src/m.f90:10-20` or
    /// `src/m.f90:10-`. A suffix that is not a range (as in `C:\src\m.f90`)
    /// is kept as part of the path.
    pub fn parse(input: &str) -> Result<Self, TargetError>
    {
        let s = input.trim();

        // Split from the right once to avoid breaking "C:\..."
        let Some((path_str, spec)) = s.rsplit_once(':')
        else
        {
            return Self::whole(s);
        };

        let spec = spec.trim();
        let looks_like_range = !spec.is_empty()
            && spec
                .chars()
                .all(|c| c.is_ascii_digit() || c == '-' || c.is_whitespace());
        if !looks_like_range
        {
            return Self::whole(s);
        }

        let path_str = path_str.trim();
        if path_str.is_empty()
        {
            return Err(TargetError::MissingPath(input.to_string()));
        }

        let (start, end) = match spec.split_once('-')
        {
            Some((a, b)) =>
            {
                let a = parse_line(a, spec)?;
                let b = if b
                    .trim()
                    .is_empty()
                {
                    None
                }
                else
                {
                    Some(parse_line(b, spec)?)
                };
                if b.is_some_and(|b| a > b)
                {
                    return Err(TargetError::Reversed(spec.to_string()));
                }
                (Some(a), b)
            }
            None =>
            {
                let n = parse_line(spec, spec)?;
                (Some(n), Some(n))
            }
        };

        Ok(Self { file: path_str.to_string(), start, end })
    }

    fn whole(path: &str) -> Result<Self, TargetError>
    {
        if path.is_empty()
        {
            return Err(TargetError::MissingPath(path.to_string()));
        }
        Ok(Self { file: path.to_string(), start: None, end: None })
    }
}

fn parse_line(
    raw: &str,
    seg: &str,
) -> Result<usize, TargetError>
{
    let n: usize = raw
        .trim()
        .parse()
        .map_err(|_| TargetError::InvalidNumber(raw.to_string()))?;
    if n == 0
    {
        return Err(TargetError::Zero(seg.to_string()));
    }
    Ok(n)
}
