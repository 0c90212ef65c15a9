use std::fmt;

use crate::error::{Error, Result};

/// Option flags a regular expression may carry, in the order they are
/// stored: alphabetical.
const ALLOWED_FLAGS: &[char] = &['i', 'l', 'm', 's', 'u', 'x'];

/// A regular expression value: a pattern plus option flags.
///
/// Both parts travel as NUL-terminated strings, so neither may contain a
/// NUL byte. The pattern is not interpreted by the codec; whether it
/// compiles is checked on decode only when the caller asks for it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Regexp {
    pattern: String,
    options: String,
}

impl Regexp {
    /// Build a regular expression value, validating and alphabetizing the
    /// option flags.
    pub fn new(pattern: impl Into<String>, options: &str) -> Result<Regexp> {
        let pattern = pattern.into();
        if pattern.as_bytes().contains(&0) {
            return Err(Error::BadRegex("pattern contains a NUL byte".into()));
        }
        for c in options.chars() {
            if !ALLOWED_FLAGS.contains(&c) {
                return Err(Error::BadRegex(format!("unknown option flag {:?}", c)));
            }
        }
        Ok(Regexp {
            pattern,
            options: alphabetize(options),
        })
    }

    /// Build from already-decoded parts without flag validation. Flags are
    /// still alphabetized so equal expressions compare equal.
    pub(crate) fn from_parts(pattern: String, options: String) -> Regexp {
        let options = if options.as_bytes().windows(2).all(|w| w[0] <= w[1]) {
            options
        } else {
            alphabetize(&options)
        };
        Regexp { pattern, options }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn options(&self) -> &str {
        &self.options
    }

    /// Check the pattern compiles as a real regular expression.
    pub fn compile_check(&self) -> Result<()> {
        regex::Regex::new(&self.pattern)
            .map(|_| ())
            .map_err(|e| Error::BadRegex(e.to_string()))
    }
}

fn alphabetize(options: &str) -> String {
    let mut flags: Vec<char> = options.chars().collect();
    flags.sort_unstable();
    flags.into_iter().collect()
}

impl fmt::Display for Regexp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "/{}/{}", self.pattern, self.options)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flags_are_alphabetized() {
        let re = Regexp::new("^a+b", "mix").unwrap();
        assert_eq!(re.options(), "imx");
        assert_eq!(re.pattern(), "^a+b");
    }

    #[test]
    fn bad_flag_rejected() {
        assert!(matches!(Regexp::new("a", "g"), Err(Error::BadRegex(_))));
    }

    #[test]
    fn nul_in_pattern_rejected() {
        assert!(Regexp::new("a\0b", "").is_err());
    }

    #[test]
    fn compile_check() {
        assert!(Regexp::new("^ab?c$", "i").unwrap().compile_check().is_ok());
        assert!(Regexp::from_parts("(unclosed".into(), String::new())
            .compile_check()
            .is_err());
    }
}
