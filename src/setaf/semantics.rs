use anyhow::anyhow;
use std::str::FromStr;

/// The acceptability semantics under which extensions are computed.
///
/// Only the stable semantics is supported: a stable extension is a conflict-free argument
/// set attacking every argument outside it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Semantics {
    /// The stable semantics.
    #[default]
    Stable,
}

impl FromStr for Semantics {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Stable" => Ok(Semantics::Stable),
            _ => Err(anyhow!("unknown semantics: {}", s)),
        }
    }
}

impl AsRef<str> for Semantics {
    fn as_ref(&self) -> &str {
        match self {
            Semantics::Stable => "Stable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!(Semantics::Stable, "Stable".parse().unwrap());
        assert!("stable".parse::<Semantics>().is_err());
        assert!("Preferred".parse::<Semantics>().is_err());
    }

    #[test]
    fn test_as_ref() {
        assert_eq!("Stable", Semantics::Stable.as_ref());
    }
}
