use crate::context::RequestContext;
use crate::error::HttpError;
use crate::pagination::Pageable;
use crate::server::{RawRequest, ResponseHandle};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Where a handler parameter takes its value from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamSource {
    /// The shared raw request handle.
    Request,
    /// The raw response handle.
    Response,
    /// A defaulted [`Pageable`] built from `page`, `size` and `order`.
    Pageable,
    /// A named `{placeholder}` of the route path.
    PathVariable(String),
    /// The request body, read as JSON.
    Body,
    /// One named query parameter.
    QueryParam { name: String, required: bool },
    /// Every query parameter, as a JSON object of strings.
    QueryMap,
}

impl fmt::Display for ParamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamSource::Request => f.write_str("request"),
            ParamSource::Response => f.write_str("response"),
            ParamSource::Pageable => f.write_str("pageable"),
            ParamSource::PathVariable(name) => write!(f, "path variable {name}"),
            ParamSource::Body => f.write_str("body"),
            ParamSource::QueryParam { name, .. } => write!(f, "query parameter {name}"),
            ParamSource::QueryMap => f.write_str("query map"),
        }
    }
}

/// Raw input handed to a coercion function.
#[derive(Debug)]
pub enum RawValue<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
    Map(Value),
}

/// Monomorphized conversion from raw input into the parameter's type.
pub type Coercer = fn(RawValue<'_>) -> Result<Box<dyn Any + Send>, serde_json::Error>;

fn coerce<T>(raw: RawValue<'_>) -> Result<Box<dyn Any + Send>, serde_json::Error>
where
    T: DeserializeOwned + Send + 'static,
{
    let value: T = match raw {
        // The raw text wins for string targets; JSON only for everything else.
        RawValue::Text(text) => serde_json::from_value(Value::String(text.to_string()))
            .or_else(|_| serde_json::from_str::<T>(text))?,
        RawValue::Bytes([]) => serde_json::from_value(Value::Null)?,
        RawValue::Bytes(bytes) => serde_json::from_slice(bytes).or_else(|err| {
            match std::str::from_utf8(bytes) {
                Ok(text) => serde_json::from_value(Value::String(text.to_string())),
                Err(_) => Err(err),
            }
        })?,
        RawValue::Map(map) => serde_json::from_value(map)?,
    };
    Ok(Box::new(value))
}

/// Declared handler parameter: binding source plus target type.
#[derive(Clone)]
pub struct ParamSpec {
    source: ParamSource,
    type_name: &'static str,
    coerce: Option<Coercer>,
}

impl ParamSpec {
    fn handle(source: ParamSource, type_name: &'static str) -> Self {
        Self {
            source,
            type_name,
            coerce: None,
        }
    }

    fn typed<T>(source: ParamSource) -> Self
    where
        T: DeserializeOwned + Send + 'static,
    {
        Self {
            source,
            type_name: std::any::type_name::<T>(),
            coerce: Some(coerce::<T>),
        }
    }

    #[must_use]
    pub fn request() -> Self {
        Self::handle(ParamSource::Request, std::any::type_name::<Arc<RawRequest>>())
    }

    #[must_use]
    pub fn response() -> Self {
        Self::handle(ParamSource::Response, std::any::type_name::<ResponseHandle>())
    }

    #[must_use]
    pub fn pageable() -> Self {
        Self::handle(ParamSource::Pageable, std::any::type_name::<Pageable>())
    }

    pub fn path<T>(name: impl Into<String>) -> Self
    where
        T: DeserializeOwned + Send + 'static,
    {
        Self::typed::<T>(ParamSource::PathVariable(name.into()))
    }

    #[must_use]
    pub fn body<T>() -> Self
    where
        T: DeserializeOwned + Send + 'static,
    {
        Self::typed::<T>(ParamSource::Body)
    }

    /// Required query parameter.
    pub fn query<T>(name: impl Into<String>) -> Self
    where
        T: DeserializeOwned + Send + 'static,
    {
        Self::typed::<T>(ParamSource::QueryParam {
            name: name.into(),
            required: true,
        })
    }

    pub fn optional_query<T>(name: impl Into<String>) -> Self
    where
        T: DeserializeOwned + Send + 'static,
    {
        Self::typed::<T>(ParamSource::QueryParam {
            name: name.into(),
            required: false,
        })
    }

    #[must_use]
    pub fn query_map<T>() -> Self
    where
        T: DeserializeOwned + Send + 'static,
    {
        Self::typed::<T>(ParamSource::QueryMap)
    }

    #[must_use]
    pub fn source(&self) -> &ParamSource {
        &self.source
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn label(&self) -> String {
        match &self.source {
            ParamSource::PathVariable(name) | ParamSource::QueryParam { name, .. } => name.clone(),
            other => other.to_string(),
        }
    }

    fn convert(&self, raw: RawValue<'_>) -> Result<Box<dyn Any + Send>, serde_json::Error> {
        match self.coerce {
            Some(f) => f(raw),
            // handle sources never reach here
            None => Err(<serde_json::Error as serde::de::Error>::custom(
                "parameter has no coercion",
            )),
        }
    }
}

impl fmt::Debug for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamSpec")
            .field("source", &self.source)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// A resolved parameter value.
pub enum BoundValue {
    Request(Arc<RawRequest>),
    Response(ResponseHandle),
    Pageable(Pageable),
    Value(Box<dyn Any + Send>),
    Absent,
}

impl BoundValue {
    fn into_any(self) -> Option<Box<dyn Any + Send>> {
        match self {
            BoundValue::Request(r) => Some(Box::new(r)),
            BoundValue::Response(r) => Some(Box::new(r)),
            BoundValue::Pageable(p) => Some(Box::new(p)),
            BoundValue::Value(v) => Some(v),
            BoundValue::Absent => None,
        }
    }
}

impl fmt::Debug for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundValue::Request(_) => f.write_str("Request"),
            BoundValue::Response(_) => f.write_str("Response"),
            BoundValue::Pageable(p) => f.debug_tuple("Pageable").field(p).finish(),
            BoundValue::Value(_) => f.write_str("Value(..)"),
            BoundValue::Absent => f.write_str("Absent"),
        }
    }
}

/// Bound arguments for one handler invocation, in declaration order.
#[derive(Debug)]
pub struct Args {
    values: Vec<BoundValue>,
    labels: Vec<String>,
}

impl Args {
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Move parameter `index` out as a `T`.
    ///
    /// `None` when the value is absent, already taken, or not a `T`.
    pub fn take<T: 'static>(&mut self, index: usize) -> Option<T> {
        let slot = self.values.get_mut(index)?;
        let any = std::mem::replace(slot, BoundValue::Absent).into_any()?;
        match any.downcast::<T>() {
            Ok(v) => Some(*v),
            Err(_) => {
                warn!(
                    index,
                    expected = std::any::type_name::<T>(),
                    "Bound parameter has a different type"
                );
                None
            }
        }
    }

    /// Like [`Args::take`] but an absent value is a 400 naming the parameter.
    pub fn require<T: 'static>(&mut self, index: usize) -> Result<T, HttpError> {
        self.take(index).ok_or_else(|| {
            let label = self.labels.get(index).map_or("parameter", String::as_str);
            HttpError::bad_request(format!("Parameter {label} is missing or invalid"))
        })
    }

    #[must_use]
    pub fn request(&self) -> Option<Arc<RawRequest>> {
        self.values.iter().find_map(|v| match v {
            BoundValue::Request(r) => Some(Arc::clone(r)),
            _ => None,
        })
    }

    #[must_use]
    pub fn response(&self) -> Option<ResponseHandle> {
        self.values.iter().find_map(|v| match v {
            BoundValue::Response(r) => Some(r.clone()),
            _ => None,
        })
    }

    #[must_use]
    pub fn pageable(&self) -> Option<Pageable> {
        self.values.iter().find_map(|v| match v {
            BoundValue::Pageable(p) => Some(p.clone()),
            _ => None,
        })
    }
}

/// Resolve every declared parameter against the request.
///
/// Binding does not stop at the first failure; all parameters are resolved
/// and the first structured failure in declaration order is returned.
pub fn bind(ctx: &RequestContext, params: &[ParamSpec]) -> Result<Args, HttpError> {
    let mut values = Vec::with_capacity(params.len());
    let mut first_failure: Option<HttpError> = None;

    for spec in params {
        match resolve(ctx, spec) {
            Ok(value) => values.push(value),
            Err(err) => {
                debug!(
                    request_id = %ctx.request_id(),
                    source = %spec.source,
                    error = %err,
                    "Parameter binding failed"
                );
                if first_failure.is_none() {
                    first_failure = Some(err);
                }
                values.push(BoundValue::Absent);
            }
        }
    }

    if let Some(err) = first_failure {
        return Err(err);
    }
    Ok(Args {
        values,
        labels: params.iter().map(ParamSpec::label).collect(),
    })
}

fn resolve(ctx: &RequestContext, spec: &ParamSpec) -> Result<BoundValue, HttpError> {
    let request = ctx.request();
    match &spec.source {
        ParamSource::Request => Ok(BoundValue::Request(Arc::clone(request))),
        ParamSource::Response => Ok(BoundValue::Response(ctx.response().clone())),
        ParamSource::Pageable => {
            let pairs = request
                .query_pairs()
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()));
            Ok(BoundValue::Pageable(Pageable::from_query(pairs).defaults()))
        }
        ParamSource::PathVariable(name) => {
            let raw = ctx
                .path_param(name)
                .ok_or_else(|| HttpError::bad_request(format!("Path Variable {name} is required")))?;
            Ok(lenient(spec, RawValue::Text(&raw)))
        }
        ParamSource::Body => spec
            .convert(RawValue::Bytes(request.body()))
            .map(BoundValue::Value)
            .map_err(|err| {
                debug!(error = %err, target = spec.type_name, "Body deserialization failed");
                HttpError::bad_request("Request Body could not be parsed")
            }),
        ParamSource::QueryParam { name, required } => match request.query_param(name) {
            Some(raw) => Ok(lenient(spec, RawValue::Text(raw))),
            None if *required => Err(HttpError::bad_request(format!(
                "Request Parameter {name} is required"
            ))),
            None => Ok(BoundValue::Absent),
        },
        ParamSource::QueryMap => {
            let map: Map<String, Value> = request
                .query_map()
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            Ok(lenient(spec, RawValue::Map(Value::Object(map))))
        }
    }
}

/// Coercion failures of textual sources resolve to an absent value.
fn lenient(spec: &ParamSpec, raw: RawValue<'_>) -> BoundValue {
    match spec.convert(raw) {
        Ok(v) => BoundValue::Value(v),
        Err(err) => {
            debug!(
                source = %spec.source,
                target = spec.type_name,
                error = %err,
                "Coercion failed, treating parameter as absent"
            );
            BoundValue::Absent
        }
    }
}
