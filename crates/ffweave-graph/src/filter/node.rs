//! A single filter invocation, e.g. `scale=640:-1`.

use std::fmt;

use ffweave_core::{Error, Result};

use crate::option::Arg;

/// Parameters of a filter node. Order is preserved exactly as supplied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FilterParams {
    /// No parameters: the node renders as its bare name.
    #[default]
    None,
    /// `name=v1:v2`
    Positional(Vec<String>),
    /// `name=k1=v1:k2=v2`
    Keyed(Vec<(String, String)>),
}

impl FilterParams {
    pub fn is_empty(&self) -> bool {
        match self {
            FilterParams::None => true,
            FilterParams::Positional(values) => values.is_empty(),
            FilterParams::Keyed(pairs) => pairs.is_empty(),
        }
    }
}

/// One stage in a filter chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterNode {
    name: String,
    params: FilterParams,
}

impl FilterNode {
    /// A filter with no parameters (e.g. `null`, `hflip`).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: FilterParams::None,
        }
    }

    /// A filter with positional parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the name is empty or a value
    /// has no plain string form (null, list or map).
    pub fn positional<I, V>(name: impl Into<String>, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Arg>,
    {
        let name = checked_name(name.into())?;
        let values = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| param_text(&name, &i.to_string(), v.into()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name,
            params: FilterParams::Positional(values),
        })
    }

    /// A filter with keyed parameters, rendered in the order given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the name or a key is empty, or a
    /// value has no plain string form.
    pub fn keyed<I, K, V>(name: impl Into<String>, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Arg>,
    {
        let name = checked_name(name.into())?;
        let pairs = pairs
            .into_iter()
            .map(|(k, v)| {
                let key = k.into();
                if key.is_empty() {
                    return Err(Error::invalid_argument(format!(
                        "filter '{name}' has a parameter with an empty key"
                    )));
                }
                let value = param_text(&name, &key, v.into())?;
                Ok((key, value))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name,
            params: FilterParams::Keyed(pairs),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &FilterParams {
        &self.params
    }
}

fn checked_name(name: String) -> Result<String> {
    if name.is_empty() {
        return Err(Error::invalid_argument("filter name must not be empty"));
    }
    Ok(name)
}

fn param_text(filter: &str, param: &str, value: Arg) -> Result<String> {
    value.as_text().ok_or_else(|| {
        Error::invalid_argument(format!(
            "filter '{filter}' parameter {param} cannot be a {} value",
            value.kind()
        ))
    })
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;

        if self.params.is_empty() {
            return Ok(());
        }

        write!(f, "=")?;
        match &self.params {
            FilterParams::None => {}
            FilterParams::Positional(values) => write!(f, "{}", values.join(":"))?,
            FilterParams::Keyed(pairs) => {
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ":")?;
                    }
                    write!(f, "{key}={value}")?;
                }
            }
        }
        Ok(())
    }
}
