//! The flat JSON document form. Structure only; call [`crate::validate`] for
//! semantic checks.

use crate::{automaton::AutomatonSpec, error::Error};

pub fn to_json(spec: &AutomatonSpec) -> Result<String, Error> {
    serde_json::to_string(spec).map_err(|err| Error::Json(err.to_string()))
}

pub fn to_json_pretty(spec: &AutomatonSpec) -> Result<String, Error> {
    serde_json::to_string_pretty(spec).map_err(|err| Error::Json(err.to_string()))
}

pub fn from_json(src: &str) -> Result<AutomatonSpec, Error> {
    serde_json::from_str(src).map_err(|err| Error::Json(err.to_string()))
}
