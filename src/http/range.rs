//! HTTP Range parsing and resolution
//!
//! Range-sets in the `bytes=` unit, compliant with RFC 7233 except that
//! multiple ranges are returned concatenated rather than as multipart.

/// Resolved inclusive byte range, `start <= end < size`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub start: u64,
    pub end: u64,
}

impl RangeSpec {
    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("malformed range '{0}'")]
    Malformed(String),

    #[error("range end {end} is past the last byte of a {size}-byte resource")]
    EndExceedsSize { end: i128, size: u64 },

    #[error("range start {start} is after end {end}")]
    StartAfterEnd { start: i128, end: i128 },
}

/// Unresolved range token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawRange {
    /// `A-B`
    Bounded(u64, u64),
    /// `A-`
    From(u64),
    /// `-B`, the last B bytes
    Suffix(u64),
}

impl RawRange {
    pub fn parse(token: &str) -> Result<Self, RangeError> {
        let malformed = || RangeError::Malformed(token.to_string());

        let (start, end) = token.trim().split_once('-').ok_or_else(malformed)?;
        let number = |s: &str| s.trim().parse::<u64>().map_err(|_| malformed());

        match (start.trim().is_empty(), end.trim().is_empty()) {
            (false, false) => Ok(Self::Bounded(number(start)?, number(end)?)),
            (false, true) => Ok(Self::From(number(start)?)),
            (true, false) => Ok(Self::Suffix(number(end)?)),
            (true, true) => Err(malformed()),
        }
    }

    /// Resolve against the resource's total size
    pub fn resolve(self, size: u64) -> Result<RangeSpec, RangeError> {
        let total = i128::from(size);
        let (start, end) = match self {
            Self::Bounded(a, b) => (i128::from(a), i128::from(b)),
            Self::From(a) => (i128::from(a), total - 1),
            // A suffix longer than the resource covers all of it
            Self::Suffix(b) => ((total - i128::from(b)).max(0), total - 1),
        };

        if end > total - 1 {
            return Err(RangeError::EndExceedsSize { end, size });
        }
        if start > end {
            return Err(RangeError::StartAfterEnd { start, end });
        }

        let bound = |n: i128| u64::try_from(n).map_err(|_| RangeError::StartAfterEnd { start, end });
        Ok(RangeSpec {
            start: bound(start)?,
            end: bound(end)?,
        })
    }
}

/// Split a `Range` header into its raw tokens
///
/// Returns `None` when there is no header, the unit is not `bytes`, or the
/// set is empty; such requests are served whole.
///
/// # Examples
/// ```
/// use poteto::http::range::range_tokens;
///
/// assert_eq!(range_tokens(Some("bytes=0-1, 5-")), Some(vec!["0-1", "5-"]));
/// assert_eq!(range_tokens(Some("items=0-1")), None);
/// assert_eq!(range_tokens(None), None);
/// ```
pub fn range_tokens(header: Option<&str>) -> Option<Vec<&str>> {
    let set = header?.trim().strip_prefix("bytes=")?;
    let tokens: Vec<&str> = set
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    (!tokens.is_empty()).then_some(tokens)
}

/// Resolve every token of a range-set; any bad token fails the whole set
pub fn resolve_ranges(tokens: &[&str], size: u64) -> Result<Vec<RangeSpec>, RangeError> {
    tokens
        .iter()
        .map(|token| RawRange::parse(token)?.resolve(size))
        .collect()
}

/// Where a ranged write starts and how many bytes it may write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteWindow {
    pub position: u64,
    /// `None` means bounded only by the body
    pub limit: Option<u64>,
}

impl WriteWindow {
    /// Window for a write token
    ///
    /// Only suffix tokens depend on the resource, so `current_size` is
    /// consulted for those alone.
    pub fn from_raw(raw: RawRange, current_size: u64) -> Result<Self, RangeError> {
        match raw {
            RawRange::Bounded(start, end) if start > end => Err(RangeError::StartAfterEnd {
                start: i128::from(start),
                end: i128::from(end),
            }),
            // `0-18446744073709551615` has no representable length
            RawRange::Bounded(start, end) => Ok(Self {
                position: start,
                limit: (end - start).checked_add(1),
            }),
            RawRange::From(start) => Ok(Self {
                position: start,
                limit: None,
            }),
            RawRange::Suffix(_) => {
                let spec = raw.resolve(current_size)?;
                Ok(Self {
                    position: spec.start,
                    limit: Some(spec.len()),
                })
            }
        }
    }
}
