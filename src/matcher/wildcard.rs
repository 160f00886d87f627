use regex::Regex;

/// Character class of everything an identifier may contain.
const LEGAL_CLASS: &str = r"[A-Za-z0-9\-_.:/]";

fn is_legal(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '/')
}

/// A pattern that could not be turned into a matcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("illegal character {character:?} at position {position} in pattern '{pattern}'")]
    IllegalCharacter {
        pattern: String,
        character: char,
        position: usize,
    },

    #[error("pattern '{pattern}' could not be compiled: {reason}")]
    Compile { pattern: String, reason: String },
}

/// Compiled identifier predicate.
///
/// `*` matches any run of identifier characters and `?` exactly one. A
/// pattern with wildcards always has to cover the whole identifier. Without
/// wildcards, `exact` chooses between identity (`true`) and prefix matching
/// (`false`). The empty pattern matches everything.
///
/// A malformed pattern yields an error, never a matcher.
#[derive(Debug, Clone)]
pub enum Matcher {
    Any,
    Pattern(Regex),
}

impl Matcher {
    pub fn compile(pattern: &str, exact: bool) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Ok(Matcher::Any);
        }

        let mut expr = String::with_capacity(pattern.len() * 2 + 2);
        let mut wildcard = false;
        expr.push('^');
        for (position, character) in pattern.chars().enumerate() {
            match character {
                '*' => {
                    wildcard = true;
                    expr.push_str(LEGAL_CLASS);
                    expr.push('*');
                }
                '?' => {
                    wildcard = true;
                    expr.push_str(LEGAL_CLASS);
                }
                c if is_legal(c) => expr.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
                c => {
                    return Err(PatternError::IllegalCharacter {
                        pattern: pattern.to_string(),
                        character: c,
                        position,
                    })
                }
            }
        }
        if exact || wildcard {
            expr.push('$');
        }

        Regex::new(&expr)
            .map(Matcher::Pattern)
            .map_err(|err| PatternError::Compile {
                pattern: pattern.to_string(),
                reason: err.to_string(),
            })
    }

    pub fn matches(&self, id: &str) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::Pattern(re) => re.is_match(id),
        }
    }
}
