//! `{field}` templating for credential file paths.
//!
//! A path taken from `MONGO_CREDENTIAL_FILE` may reference connection options
//! by name, e.g. `/etc/mongo/{env}.credentials`. The referenced options are
//! consumed: they are removed from the option bag and substituted into the
//! path. `{{` and `}}` stand for literal braces.

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

/// Regex for one template token: an escaped brace, a `{field}` reference,
/// or a stray brace.
static TEMPLATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{|\}\}|\{(?P<field>[^{}]*)\}|[{}]").unwrap());

/// Connection parameter names that a template field may not use.
///
/// Covers the driver constructor's own parameters and the ones consumed by
/// the resolver.
pub const RESERVED_PARAMETERS: &[&str] = &[
    "host",
    "port",
    "document_class",
    "tz_aware",
    "connect",
    "type_registry",
    "credentials_file",
    "authenticate",
    "username",
    "password",
    "authSource",
];

/// Whether `name` is a reserved connection parameter.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_PARAMETERS.contains(&name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A parsed credential file path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a path template.
    ///
    /// A field may carry a conversion or format specifier (`{env!s}`,
    /// `{env:>4}`); only the name before it is significant.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |message: &str| Error::InvalidTemplate {
            template: raw.to_string(),
            message: message.to_string(),
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut last = 0;

        for caps in TEMPLATE_TOKEN.captures_iter(raw) {
            let Some(token) = caps.get(0) else {
                continue;
            };
            literal.push_str(&raw[last..token.start()]);
            last = token.end();

            match token.as_str() {
                "{{" => literal.push('{'),
                "}}" => literal.push('}'),
                "{" => return Err(invalid("expected '}' before end of string")),
                "}" => return Err(invalid("single '}' encountered")),
                _ => {
                    let field = caps.name("field").map_or("", |m| m.as_str());
                    let name = field.split(['!', ':']).next().unwrap_or("");
                    if name.is_empty() {
                        return Err(invalid("positional fields are not supported"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(name.to_string()));
                }
            }
        }
        literal.push_str(&raw[last..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(PathTemplate {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The template as given.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Names of every field referenced by the template.
    pub fn fields(&self) -> BTreeSet<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Field(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Whether the template references any field.
    pub fn is_templated(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, Segment::Field(_)))
    }

    /// Substitute `values` into the template. Unknown fields render empty.
    pub fn render(&self, values: &BTreeMap<String, String>) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.as_str(),
                Segment::Field(name) => values.get(name).map_or("", String::as_str),
            })
            .collect()
    }

    /// Validate the template against the option bag, then consume the
    /// referenced options and render the path.
    ///
    /// Fails with every reserved-name clash, or else with every field that
    /// has no value in `options`. On failure `options` is left untouched.
    pub fn apply(&self, options: &mut BTreeMap<String, String>) -> Result<String> {
        let fields = self.fields();

        let clashes: Vec<String> = fields
            .iter()
            .filter(|name| is_reserved(name))
            .map(|name| name.to_string())
            .collect();
        if !clashes.is_empty() {
            return Err(Error::TemplateNameClash { names: clashes });
        }

        let missing: Vec<String> = fields
            .iter()
            .filter(|name| !options.contains_key(**name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::TemplateMissingFields { names: missing });
        }

        let values: BTreeMap<String, String> = fields
            .iter()
            .filter_map(|name| options.remove_entry(*name))
            .collect();

        Ok(self.render(&values))
    }
}
